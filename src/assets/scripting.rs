/// Declaration of the entry function invoked when a script is started.
pub const START_FUNCTION: &str = "void Start()";

/// Handle to a module compiled by a [`ScriptEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScriptModule(pub u64);

/// Embedded scripting runtime supplied by the host.
pub trait ScriptEngine {
    /// Compiles `source` into a module named `name`. Compiling a name twice
    /// replaces the earlier module.
    fn compile(&mut self, name: &str, source: &str) -> anyhow::Result<ScriptModule>;

    fn has_function(&self, module: ScriptModule, declaration: &str) -> bool;

    fn execute(&mut self, module: ScriptModule, declaration: &str) -> anyhow::Result<()>;
}
