use crate::assets::{
    error::{CacheError, CacheResult},
    Resource,
};

const VS_SIGNATURE: &str = "void VS(";
const PS_SIGNATURE: &str = "void PS(";

/// A combined GLSL source holding a `VS()` and/or `PS()` entry point. Each
/// stage gets its own copy of the source with the other entry commented out.
#[derive(Debug)]
pub struct Shader {
    pub name: String,
    pub id: uuid::Uuid,
    pub source: String,
    pub vs_source: Option<String>,
    pub ps_source: Option<String>,
}

impl Default for Shader {
    fn default() -> Self {
        Shader {
            name: String::new(),
            id: uuid::Uuid::new_v4(),
            source: String::new(),
            vs_source: None,
            ps_source: None,
        }
    }
}

impl Shader {
    pub fn load(&mut self, content: &[u8]) -> CacheResult<()> {
        let source = std::str::from_utf8(content)
            .map_err(|err| CacheError::parse(Self::type_name(), &self.name, err))?;
        if source.trim().is_empty() {
            return Err(CacheError::parse(Self::type_name(), &self.name, "empty shader source"));
        }

        self.vs_source = source
            .contains(VS_SIGNATURE)
            .then(|| comment_out_function(source, PS_SIGNATURE));
        self.ps_source = source
            .contains(PS_SIGNATURE)
            .then(|| comment_out_function(source, VS_SIGNATURE));
        self.source = source.to_owned();

        Ok(())
    }
}

/// Wraps the function starting at `signature` (up to its matching closing
/// brace) in a block comment. Returns the code unchanged if not found.
fn comment_out_function(code: &str, signature: &str) -> String {
    let Some(start) = code.find(signature) else {
        return code.to_owned();
    };

    let mut depth = 0;
    let mut end = None;
    for (i, c) in code[start..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    end = Some(start + i + 1);
                    break;
                }
            }
            _ => {}
        }
    }

    match end {
        Some(end) => format!("{}/*{}*/{}", &code[..start], &code[start..end], &code[end..]),
        None => code.to_owned(),
    }
}

impl Resource for Shader {
    fn type_name() -> &'static str {
        "Shader"
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

#[cfg(test)]
mod tests {
    use super::*;

    const UNLIT: &str = "uniform vec4 cColor;
void VS()
{
    gl_Position = vec4(0.0);
}
void PS()
{
    if (true) { gl_FragColor = cColor; }
}
";

    #[test]
    fn splits_stages() {
        let mut shader = Shader::default();
        shader.load(UNLIT.as_bytes()).unwrap();

        let vs = shader.vs_source.unwrap();
        assert!(vs.contains("/*void PS()"));
        assert!(!vs.contains("/*void VS()"));
        assert!(vs.ends_with("}*/\n"));

        let ps = shader.ps_source.unwrap();
        assert!(ps.contains("/*void VS()"));
        assert!(ps.contains("uniform vec4 cColor;"));
    }

    #[test]
    fn vertex_only_source_has_no_pixel_stage() {
        let mut shader = Shader::default();
        shader.load(b"void VS() { }").unwrap();
        assert!(shader.vs_source.is_some());
        assert!(shader.ps_source.is_none());
    }

    #[test]
    fn empty_source_fails() {
        let mut shader = Shader::default();
        assert!(shader.load(b"  \n").is_err());
    }
}
