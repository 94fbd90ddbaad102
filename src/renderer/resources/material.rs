use std::collections::BTreeMap;

use cgmath::{Vector2, Vector3, Vector4};

use crate::assets::{
    error::{CacheError, CacheResult},
    Resource,
};

#[derive(Debug, Clone, PartialEq)]
pub struct TechniqueEntry {
    pub name: String,
    pub quality: u32,
    pub lod_distance: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MaterialParameter {
    Float(f32),
    Vec2(Vector2<f32>),
    Vec3(Vector3<f32>),
    Vec4(Vector4<f32>),
    Text(String),
}

impl MaterialParameter {
    pub fn parse(value: &str) -> Self {
        let floats: Result<Vec<f32>, _> = value.split_whitespace().map(str::parse::<f32>).collect();

        match floats.as_deref() {
            Ok([x]) => MaterialParameter::Float(*x),
            Ok([x, y]) => MaterialParameter::Vec2(Vector2::new(*x, *y)),
            Ok([x, y, z]) => MaterialParameter::Vec3(Vector3::new(*x, *y, *z)),
            Ok([x, y, z, w]) => MaterialParameter::Vec4(Vector4::new(*x, *y, *z, *w)),
            _ => MaterialParameter::Text(value.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullMode {
    None,
    #[default]
    Ccw,
    Cw,
}

impl CullMode {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "none" => Some(CullMode::None),
            "ccw" => Some(CullMode::Ccw),
            "cw" => Some(CullMode::Cw),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Material {
    pub name: String,
    pub id: uuid::Uuid,
    pub techniques: Vec<TechniqueEntry>,
    /// Texture unit -> texture resource name.
    pub textures: BTreeMap<String, String>,
    pub parameters: BTreeMap<String, MaterialParameter>,
    pub cull: CullMode,
    pub shadow_cull: CullMode,
}

impl Default for Material {
    fn default() -> Self {
        Material {
            name: String::new(),
            id: uuid::Uuid::new_v4(),
            techniques: vec![],
            textures: BTreeMap::new(),
            parameters: BTreeMap::new(),
            cull: CullMode::default(),
            shadow_cull: CullMode::default(),
        }
    }
}

impl Material {
    /// Loads from an already parsed `<material>` element.
    pub fn load(&mut self, source: roxmltree::Node) -> CacheResult<()> {
        if source.tag_name().name() != "material" {
            return Err(self.fail(format!(
                "root element must be <material>, found <{}>",
                source.tag_name().name()
            )));
        }

        let mut techniques = vec![];
        let mut textures = BTreeMap::new();
        let mut parameters = BTreeMap::new();
        let mut cull = CullMode::default();
        let mut shadow_cull = CullMode::default();

        for elem in source.children().filter(|n| n.is_element()) {
            match elem.tag_name().name() {
                "technique" => {
                    let name = self.required(&elem, "name")?;
                    techniques.push(TechniqueEntry {
                        name,
                        quality: elem
                            .attribute("quality")
                            .and_then(|q| q.trim().parse().ok())
                            .unwrap_or(0),
                        lod_distance: elem
                            .attribute("loddistance")
                            .and_then(|d| d.trim().parse().ok())
                            .unwrap_or(0.0),
                    });
                }
                "texture" => {
                    let unit = self.required(&elem, "unit")?;
                    let name = self.required(&elem, "name")?;
                    textures.insert(unit, name);
                }
                "parameter" => {
                    let name = self.required(&elem, "name")?;
                    let value = self.required(&elem, "value")?;
                    parameters.insert(name, MaterialParameter::parse(&value));
                }
                "cull" => cull = self.cull_mode(&elem)?,
                "shadowcull" => shadow_cull = self.cull_mode(&elem)?,
                _ => {}
            }
        }

        self.techniques = techniques;
        self.textures = textures;
        self.parameters = parameters;
        self.cull = cull;
        self.shadow_cull = shadow_cull;

        Ok(())
    }

    fn required(&self, elem: &roxmltree::Node, attr: &str) -> CacheResult<String> {
        elem.attribute(attr).map(str::to_owned).ok_or_else(|| {
            self.fail(format!(
                "<{}> is missing the `{attr}` attribute",
                elem.tag_name().name()
            ))
        })
    }

    fn cull_mode(&self, elem: &roxmltree::Node) -> CacheResult<CullMode> {
        let value = self.required(elem, "value")?;
        CullMode::parse(&value).ok_or_else(|| self.fail(format!("unknown cull mode {value}")))
    }

    fn fail(&self, reason: String) -> CacheError {
        CacheError::parse(Self::type_name(), &self.name, reason)
    }
}

impl Resource for Material {
    fn type_name() -> &'static str {
        "Material"
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
