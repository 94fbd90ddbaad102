use super::{
    error::{CacheError, CacheResult},
    scripting::{ScriptEngine, ScriptModule, START_FUNCTION},
    Resource,
};

#[derive(Debug)]
pub struct ScriptFile {
    pub name: String,
    pub uuid: uuid::Uuid,
    pub source: String,
    pub module: Option<ScriptModule>,
}

impl Default for ScriptFile {
    fn default() -> Self {
        ScriptFile {
            name: String::new(),
            uuid: uuid::Uuid::new_v4(),
            source: String::new(),
            module: None,
        }
    }
}

impl ScriptFile {
    pub fn load(&mut self, content: &[u8], engine: &mut dyn ScriptEngine) -> CacheResult<()> {
        // A failed compile leaves the script without a module.
        self.module = None;

        let source = std::str::from_utf8(content)
            .map_err(|err| CacheError::parse(Self::type_name(), &self.name, err))?;
        self.source = source.to_owned();

        let module = engine
            .compile(&self.name, source)
            .map_err(|err| CacheError::parse(Self::type_name(), &self.name, err))?;
        self.module = Some(module);

        Ok(())
    }

    pub fn has_start(&self, engine: &dyn ScriptEngine) -> bool {
        self.module
            .is_some_and(|module| engine.has_function(module, START_FUNCTION))
    }

    pub fn start(&self, engine: &mut dyn ScriptEngine) -> CacheResult<()> {
        let Some(module) = self.module.filter(|module| engine.has_function(*module, START_FUNCTION))
        else {
            return Err(CacheError::MissingScriptEntryPoint(self.name.clone()));
        };

        engine
            .execute(module, START_FUNCTION)
            .map_err(|err| CacheError::ScriptFailed {
                name: self.name.clone(),
                reason: err.to_string(),
            })
    }
}

impl Resource for ScriptFile {
    fn type_name() -> &'static str {
        "ScriptFile"
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_owned();
    }

    fn uuid(&self) -> uuid::Uuid {
        self.uuid
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use super::*;

    /// Treats each line of source as a declared function; `fail` in the
    /// source makes compilation fail, a `throw` line makes execution fail.
    #[derive(Default)]
    pub struct FakeEngine {
        pub modules: HashMap<u64, Vec<String>>,
        pub executed: Vec<(u64, String)>,
        next: u64,
    }

    impl ScriptEngine for FakeEngine {
        fn compile(&mut self, _name: &str, source: &str) -> anyhow::Result<ScriptModule> {
            if source.contains("fail") {
                anyhow::bail!("syntax error");
            }
            self.next += 1;
            self.modules
                .insert(self.next, source.lines().map(str::to_owned).collect());
            Ok(ScriptModule(self.next))
        }

        fn has_function(&self, module: ScriptModule, declaration: &str) -> bool {
            self.modules
                .get(&module.0)
                .is_some_and(|lines| lines.iter().any(|l| l.starts_with(declaration)))
        }

        fn execute(&mut self, module: ScriptModule, declaration: &str) -> anyhow::Result<()> {
            self.executed.push((module.0, declaration.to_owned()));
            let throws = self
                .modules
                .get(&module.0)
                .is_some_and(|lines| lines.iter().any(|l| l == "throw"));
            if throws {
                anyhow::bail!("uncaught exception in {declaration}");
            }
            Ok(())
        }
    }

    fn script(name: &str) -> ScriptFile {
        let mut file = ScriptFile::default();
        file.set_name(name);
        file
    }

    #[test]
    fn compiled_script_can_start() {
        let mut engine = FakeEngine::default();
        let mut file = script("Scripts/Main.as");

        file.load(b"void Start() {}", &mut engine).unwrap();
        assert!(file.has_start(&engine));
        file.start(&mut engine).unwrap();
        assert_eq!(engine.executed.len(), 1);
    }

    #[test]
    fn missing_entry_point_is_reported() {
        let mut engine = FakeEngine::default();
        let mut file = script("Scripts/Lib.as");

        file.load(b"int helper() { return 1; }", &mut engine).unwrap();
        let err = file.start(&mut engine).unwrap_err();
        assert!(matches!(err, CacheError::MissingScriptEntryPoint(_)));
    }

    #[test]
    fn failed_compile_drops_previous_module() {
        let mut engine = FakeEngine::default();
        let mut file = script("Scripts/Main.as");

        file.load(b"void Start() {}", &mut engine).unwrap();
        assert!(file.load(b"void Start() { fail }", &mut engine).is_err());
        assert!(file.module.is_none());
    }
}
