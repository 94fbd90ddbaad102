use crate::assets::{
    error::{CacheError, CacheResult},
    Resource,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pass {
    pub name: String,
    pub vs: String,
    pub ps: String,
    pub vs_defines: String,
    pub ps_defines: String,
    pub blend: Option<String>,
    pub depth_test: Option<String>,
    pub depth_write: bool,
}

#[derive(Debug)]
pub struct Technique {
    pub name: String,
    pub id: uuid::Uuid,
    pub passes: Vec<Pass>,
}

impl Default for Technique {
    fn default() -> Self {
        Technique {
            name: String::new(),
            id: uuid::Uuid::new_v4(),
            passes: vec![],
        }
    }
}

impl Technique {
    pub fn load(&mut self, content: &[u8]) -> CacheResult<()> {
        let text = std::str::from_utf8(content).map_err(|err| self.fail(err))?;
        let doc = roxmltree::Document::parse(text).map_err(|err| self.fail(err))?;
        let root = doc.root_element();
        if root.tag_name().name() != "technique" {
            return Err(self.fail(format!(
                "root element must be <technique>, found <{}>",
                root.tag_name().name()
            )));
        }

        // Technique-level shaders and defines are the defaults for each pass.
        let vs = attr(root, "vs").unwrap_or_default();
        let ps = attr(root, "ps").unwrap_or_default();
        let vs_defines = attr(root, "vsdefines").unwrap_or_default();
        let ps_defines = attr(root, "psdefines").unwrap_or_default();

        let mut passes = vec![];
        for pass in root.children().filter(|n| n.has_tag_name("pass")) {
            let Some(name) = attr(pass, "name") else {
                return Err(self.fail("<pass> is missing the `name` attribute"));
            };

            passes.push(Pass {
                name,
                vs: attr(pass, "vs").unwrap_or_else(|| vs.clone()),
                ps: attr(pass, "ps").unwrap_or_else(|| ps.clone()),
                vs_defines: join_defines(&vs_defines, pass.attribute("vsdefines")),
                ps_defines: join_defines(&ps_defines, pass.attribute("psdefines")),
                blend: attr(pass, "blend"),
                depth_test: attr(pass, "depthtest"),
                depth_write: pass
                    .attribute("depthwrite")
                    .map_or(true, |v| v.eq_ignore_ascii_case("true")),
            });
        }

        self.passes = passes;
        Ok(())
    }

    pub fn pass(&self, name: &str) -> Option<&Pass> {
        self.passes.iter().find(|pass| pass.name == name)
    }

    fn fail(&self, reason: impl ToString) -> CacheError {
        CacheError::parse(Self::type_name(), &self.name, reason)
    }
}

fn attr(node: roxmltree::Node, name: &str) -> Option<String> {
    node.attribute(name).map(str::to_owned)
}

fn join_defines(base: &str, extra: Option<&str>) -> String {
    match extra {
        Some(extra) if !base.is_empty() => format!("{base} {extra}"),
        Some(extra) => extra.to_owned(),
        None => base.to_owned(),
    }
}

impl Resource for Technique {
    fn type_name() -> &'static str {
        "Technique"
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
