use bitflags::bitflags;

use crate::assets::{
    error::{CacheError, CacheResult},
    memory_buffer::{EndOfData, MemoryBuffer},
    Resource,
};

bitflags! {
    /// Vertex layout of legacy `UMDL` models.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ElementMask: u32 {
        const POSITION = 0x1;
        const NORMAL = 0x2;
        const COLOR = 0x4;
        const TEXCOORD1 = 0x8;
        const TEXCOORD2 = 0x10;
        const CUBETEXCOORD1 = 0x20;
        const CUBETEXCOORD2 = 0x40;
        const TANGENT = 0x80;
        const BLENDWEIGHTS = 0x100;
        const BLENDINDICES = 0x200;
        const INSTANCEMATRIX1 = 0x400;
        const INSTANCEMATRIX2 = 0x800;
        const INSTANCEMATRIX3 = 0x1000;
        const OBJECTINDEX = 0x2000;
    }
}

impl ElementMask {
    pub fn vertex_size(self) -> usize {
        const SIZES: [(ElementMask, usize); 14] = [
            (ElementMask::POSITION, 12),
            (ElementMask::NORMAL, 12),
            (ElementMask::COLOR, 4),
            (ElementMask::TEXCOORD1, 8),
            (ElementMask::TEXCOORD2, 8),
            (ElementMask::CUBETEXCOORD1, 12),
            (ElementMask::CUBETEXCOORD2, 12),
            (ElementMask::TANGENT, 16),
            (ElementMask::BLENDWEIGHTS, 16),
            (ElementMask::BLENDINDICES, 4),
            (ElementMask::INSTANCEMATRIX1, 16),
            (ElementMask::INSTANCEMATRIX2, 16),
            (ElementMask::INSTANCEMATRIX3, 16),
            (ElementMask::OBJECTINDEX, 4),
        ];

        SIZES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, size)| size)
            .sum()
    }
}

/// Size of a packed `UMD2` element descriptor's data type.
fn element_type_size(desc: u32) -> Option<usize> {
    match desc & 0xff {
        0 | 1 | 5 | 6 => Some(4), // int, float, ubyte4, ubyte4_norm
        2 => Some(8),
        3 => Some(12),
        4 => Some(16),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelVertexBuffer {
    pub vertex_count: u32,
    pub vertex_size: usize,
    pub morph_range: (u32, u32),
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelIndexBuffer {
    pub index_count: u32,
    pub index_size: u32,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeometryLod {
    pub distance: f32,
    pub primitive_type: u32,
    pub vertex_buffer: usize,
    pub index_buffer: usize,
    pub index_start: u32,
    pub index_count: u32,
}

#[derive(Debug)]
pub struct Model {
    pub name: String,
    pub id: uuid::Uuid,
    pub vertex_buffers: Vec<ModelVertexBuffer>,
    pub index_buffers: Vec<ModelIndexBuffer>,
    /// Per geometry: bone mapping and LOD levels.
    pub geometries: Vec<(Vec<u32>, Vec<GeometryLod>)>,
}

impl Default for Model {
    fn default() -> Self {
        Model {
            name: String::new(),
            id: uuid::Uuid::new_v4(),
            vertex_buffers: vec![],
            index_buffers: vec![],
            geometries: vec![],
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModelCreationError {
    #[error("not a model file (file id {0:?})")]
    InvalidFileId([u8; 4]),
    #[error("unknown vertex element type in descriptor {0:#x}")]
    UnknownElementType(u32),
    #[error("geometry references missing {0} buffer {1}")]
    MissingBuffer(&'static str, usize),
    #[error(transparent)]
    Truncated(#[from] EndOfData),
}

impl Model {
    pub fn load(&mut self, bytes: &[u8]) -> CacheResult<()> {
        let (vertex_buffers, index_buffers, geometries) = Self::parse(bytes)
            .map_err(|err| CacheError::parse(Self::type_name(), &self.name, err))?;

        self.vertex_buffers = vertex_buffers;
        self.index_buffers = index_buffers;
        self.geometries = geometries;
        Ok(())
    }

    #[allow(clippy::type_complexity)]
    fn parse(
        bytes: &[u8],
    ) -> Result<
        (
            Vec<ModelVertexBuffer>,
            Vec<ModelIndexBuffer>,
            Vec<(Vec<u32>, Vec<GeometryLod>)>,
        ),
        ModelCreationError,
    > {
        let mut buffer = MemoryBuffer::new(bytes);

        let file_id = buffer.read_file_id()?;
        let has_element_descs = match &file_id {
            b"UMDL" => false,
            b"UMD2" => true,
            _ => return Err(ModelCreationError::InvalidFileId(file_id)),
        };

        let num_vertex_buffers = buffer.read_u32()?;
        let mut vertex_buffers = vec![];
        for _ in 0..num_vertex_buffers {
            let vertex_count = buffer.read_u32()?;

            let vertex_size = if has_element_descs {
                let num_elements = buffer.read_u32()?;
                let mut size = 0;
                for _ in 0..num_elements {
                    let desc = buffer.read_u32()?;
                    size += element_type_size(desc)
                        .ok_or(ModelCreationError::UnknownElementType(desc))?;
                }
                size
            } else {
                ElementMask::from_bits_truncate(buffer.read_u32()?).vertex_size()
            };

            let morph_range = (buffer.read_u32()?, buffer.read_u32()?);
            let data = buffer
                .read_bytes((vertex_count as usize).saturating_mul(vertex_size))?
                .to_vec();

            vertex_buffers.push(ModelVertexBuffer {
                vertex_count,
                vertex_size,
                morph_range,
                data,
            });
        }

        let num_index_buffers = buffer.read_u32()?;
        let mut index_buffers = vec![];
        for _ in 0..num_index_buffers {
            let index_count = buffer.read_u32()?;
            let index_size = buffer.read_u32()?;
            let data = buffer
                .read_bytes((index_count as usize).saturating_mul(index_size as usize))?
                .to_vec();

            index_buffers.push(ModelIndexBuffer {
                index_count,
                index_size,
                data,
            });
        }

        let num_geometries = buffer.read_u32()?;
        let mut geometries = vec![];
        for _ in 0..num_geometries {
            let num_bones = buffer.read_u32()?;
            let bone_mapping = (0..num_bones)
                .map(|_| buffer.read_u32())
                .collect::<Result<Vec<_>, _>>()?;

            let num_lods = buffer.read_u32()?;
            let mut lods = vec![];
            for _ in 0..num_lods {
                let lod = GeometryLod {
                    distance: f32::from_bits(buffer.read_u32()?),
                    primitive_type: buffer.read_u32()?,
                    vertex_buffer: buffer.read_u32()? as usize,
                    index_buffer: buffer.read_u32()? as usize,
                    index_start: buffer.read_u32()?,
                    index_count: buffer.read_u32()?,
                };

                if lod.vertex_buffer >= vertex_buffers.len() {
                    return Err(ModelCreationError::MissingBuffer("vertex", lod.vertex_buffer));
                }
                if lod.index_buffer >= index_buffers.len() {
                    return Err(ModelCreationError::MissingBuffer("index", lod.index_buffer));
                }
                lods.push(lod);
            }

            geometries.push((bone_mapping, lods));
        }

        // Morphs, skeleton and bounds follow; they are not read here.
        Ok((vertex_buffers, index_buffers, geometries))
    }
}

impl Resource for Model {
    fn type_name() -> &'static str {
        "Model"
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_owned();
    }

    fn uuid(&self) -> uuid::Uuid {
        self.id
    }
}

/// A one-triangle `UMDL` model with position-only vertices.
#[cfg(test)]
pub(crate) fn triangle_mdl() -> Vec<u8> {
    fn put(out: &mut Vec<u8>, v: u32) {
        out.extend_from_slice(&v.to_le_bytes());
    }

    let mut out = b"UMDL".to_vec();
    // vertex buffers: count, vertex count, mask, morph range
    for v in [1, 3, ElementMask::POSITION.bits(), 0, 0] {
        put(&mut out, v);
    }
    for v in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
        put(&mut out, v.to_bits());
    }

    // index buffers: count, index count, index size
    for v in [1, 3, 2] {
        put(&mut out, v);
    }
    out.extend_from_slice(&[0, 0, 1, 0, 2, 0]);

    // geometries: count, bones, lods, then one lod
    for v in [1, 0, 1, 0.0f32.to_bits(), 0, 0, 0, 0, 3] {
        put(&mut out, v);
    }
    out
}
