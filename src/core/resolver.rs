use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::Result;

use super::parser::{simple_type_name, CallExpr, JavaParser, MethodDecl, Receiver, SourceRange, SourceUnit};

/// Types resolvable without any import; calls landing here are bound to the
/// standard library, which has no analyzable source
const JAVA_LANG_TYPES: &[&str] = &[
    "Boolean", "Byte", "Character", "Class", "Double", "Enum", "Exception",
    "Float", "Integer", "Iterable", "Long", "Math", "Number", "Object",
    "Runnable", "Runtime", "RuntimeException", "Short", "String",
    "StringBuilder", "StringBuffer", "System", "Thread", "Throwable",
];

/// A call bound to a user-defined method declaration with a known location
#[derive(Debug, Clone)]
pub struct ResolvedMethod {
    /// Qualified name of the declaring type, e.g. `com.example.Worker`
    pub type_name: String,

    /// Method signature, e.g. `run(int, String)`
    pub signature: String,

    /// Signature qualified by the declaring type,
    /// e.g. `com.example.Worker.run(int, String)`
    pub qualified_signature: String,

    /// Absolute path of the declaring file
    pub file: PathBuf,

    /// Range of the method declaration
    pub range: SourceRange,
}

/// Outcome of binding one call expression.
///
/// `External` and `Unresolved` both yield no edge; keeping them apart makes
/// the skip policy an explicit branch instead of a catch-all.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Bound to a declaration inside the analyzed source set
    Resolved(ResolvedMethod),

    /// Bound to a declaration with no analyzable source (standard library)
    External,

    /// Could not be bound; indistinguishable causes, never fatal
    Unresolved,
}

/// One indexed type declaration
#[derive(Debug, Clone)]
struct TypeEntry {
    file: PathBuf,
    methods: Vec<MethodDecl>,
}

/// Immutable symbol index built once from the discovered package roots and
/// passed by reference into every resolve call.
///
/// A file is indexed only when its declared package matches its directory
/// path relative to the root it was found under; anything else is invisible
/// to resolution, exactly as a path-based classpath lookup would miss it.
#[derive(Debug, Default)]
pub struct ResolutionContext {
    /// Qualified type name to entry
    types: HashMap<String, TypeEntry>,

    /// Simple type name to the qualified names carrying it
    by_simple: HashMap<String, Vec<String>>,
}

impl ResolutionContext {
    /// Eagerly index every conforming source file beneath the given roots.
    /// Per-file parse failures are skipped; the finished context is
    /// read-only for the remainder of the run.
    pub fn build(roots: &HashSet<PathBuf>, parser: &mut JavaParser) -> Result<Self> {
        let mut context = Self::default();

        // Sorted roots keep indexing order (and first-wins collisions) stable
        let mut sorted_roots: Vec<&PathBuf> = roots.iter().collect();
        sorted_roots.sort();

        for root in sorted_roots {
            for entry in WalkDir::new(root)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let path = entry.path();
                if !entry.file_type().is_file()
                    || path.extension().and_then(|ext| ext.to_str()) != Some("java")
                {
                    continue;
                }

                let unit = match parser.parse_file(path) {
                    Ok(unit) => unit,
                    Err(e) => {
                        debug!("Not indexing {}: {}", path.display(), e);
                        continue;
                    }
                };

                if !package_matches_location(&unit, root) {
                    debug!(
                        "Not indexing {}: package does not match location under {}",
                        path.display(),
                        root.display()
                    );
                    continue;
                }

                context.index_unit(&unit);
            }
        }

        Ok(context)
    }

    fn index_unit(&mut self, unit: &SourceUnit) {
        for decl in unit.types.iter().filter(|t| !t.is_nested) {
            let qualified = match &unit.package {
                Some(package) => format!("{}.{}", package, decl.name),
                None => decl.name.clone(),
            };

            if self.types.contains_key(&qualified) {
                continue;
            }

            self.types.insert(
                qualified.clone(),
                TypeEntry {
                    file: unit.path.clone(),
                    methods: decl.methods.clone(),
                },
            );
            self.by_simple
                .entry(decl.name.clone())
                .or_default()
                .push(qualified);
        }
    }

    /// Number of indexed types
    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}

/// Where a simple type name ended up after lookup
enum TypeBinding {
    Known(String),
    External,
    Unknown,
}

/// Bind one call expression against the context, best effort.
///
/// Receiver shapes the binder understands: unqualified and `this` calls
/// (enclosing type), `new T()...`, static calls on a class name, and
/// variables with a locally declared type. Everything else is `Unresolved`.
pub fn resolve(call: &CallExpr, unit: &SourceUnit, context: &ResolutionContext) -> Resolution {
    let target_type = match &call.receiver {
        Receiver::None | Receiver::This => match &call.enclosing_type {
            Some(name) => name.clone(),
            None => return Resolution::Unresolved,
        },
        Receiver::New(name) => name.clone(),
        Receiver::Ident(ident) => match unit.var_types.get(ident) {
            Some(declared) => declared.clone(),
            None if looks_like_type_name(ident) => simple_type_name(ident),
            None => return Resolution::Unresolved,
        },
        Receiver::Other => return Resolution::Unresolved,
    };

    match bind_type(&target_type, unit, context) {
        TypeBinding::Known(qualified) => {
            let entry = &context.types[&qualified];
            match find_method(&entry.methods, &call.name, call.arg_count) {
                Some(method) => {
                    let signature = method_signature(method);
                    Resolution::Resolved(ResolvedMethod {
                        qualified_signature: format!("{}.{}", qualified, signature),
                        type_name: qualified,
                        signature,
                        file: entry.file.clone(),
                        range: method.range,
                    })
                }
                // Declared elsewhere in the hierarchy, or not at all
                None => Resolution::Unresolved,
            }
        }
        TypeBinding::External => Resolution::External,
        TypeBinding::Unknown => Resolution::Unresolved,
    }
}

/// Map a simple type name to a qualified indexed type, following Java's
/// shadowing order: explicit import, same package, wildcard imports, then
/// `java.lang`. A name only reachable through a `java.`/`javax.` import is
/// external; a globally unique simple name is accepted as a last resort.
fn bind_type(simple: &str, unit: &SourceUnit, context: &ResolutionContext) -> TypeBinding {
    let import_suffix = format!(".{}", simple);

    if let Some(import) = unit
        .imports
        .iter()
        .find(|i| !i.is_wildcard && !i.is_static && i.path.ends_with(&import_suffix))
    {
        if context.types.contains_key(&import.path) {
            return TypeBinding::Known(import.path.clone());
        }
        if is_platform_package(&import.path) {
            return TypeBinding::External;
        }
        return TypeBinding::Unknown;
    }

    let same_package = match &unit.package {
        Some(package) => format!("{}.{}", package, simple),
        None => simple.to_string(),
    };
    if context.types.contains_key(&same_package) {
        return TypeBinding::Known(same_package);
    }

    for import in unit.imports.iter().filter(|i| i.is_wildcard && !i.is_static) {
        let candidate = format!("{}.{}", import.path, simple);
        if context.types.contains_key(&candidate) {
            return TypeBinding::Known(candidate);
        }
    }

    if JAVA_LANG_TYPES.contains(&simple) {
        return TypeBinding::External;
    }

    if unit
        .imports
        .iter()
        .any(|i| i.is_wildcard && is_platform_package(&i.path))
    {
        return TypeBinding::External;
    }

    match context.by_simple.get(simple) {
        Some(qualified) if qualified.len() == 1 => TypeBinding::Known(qualified[0].clone()),
        _ => TypeBinding::Unknown,
    }
}

fn is_platform_package(path: &str) -> bool {
    path.starts_with("java.") || path.starts_with("javax.")
}

/// The package-to-directory convention the index relies on: a file
/// declaring `package a.b` must sit at `<root>/a/b`, a package-less file
/// directly at the root.
fn package_matches_location(unit: &SourceUnit, root: &Path) -> bool {
    let Some(dir) = unit.path.parent() else {
        return false;
    };
    let Ok(relative) = dir.strip_prefix(root) else {
        return false;
    };

    match &unit.package {
        Some(package) => {
            let expected: PathBuf = package.split('.').collect();
            relative == expected.as_path()
        }
        None => relative.as_os_str().is_empty(),
    }
}

/// Heuristic for static calls: Java class names start with an upper-case letter
fn looks_like_type_name(ident: &str) -> bool {
    ident.chars().next().is_some_and(|c| c.is_uppercase())
}

/// Pick a declaration by simple name and arity; exact arity wins, a varargs
/// declaration accepts any arity at or above its fixed parameter count.
/// Overload resolution beyond that is out of scope.
fn find_method<'a>(methods: &'a [MethodDecl], name: &str, arg_count: usize) -> Option<&'a MethodDecl> {
    let candidates: Vec<&MethodDecl> = methods.iter().filter(|m| m.name == name).collect();

    if let Some(exact) = candidates
        .iter()
        .find(|m| !m.is_varargs && m.param_types.len() == arg_count)
    {
        return Some(exact);
    }

    candidates
        .into_iter()
        .find(|m| m.is_varargs && arg_count + 1 >= m.param_types.len())
}

/// `name(T1, T2)` using the declared parameter type text
fn method_signature(method: &MethodDecl) -> String {
    format!("{}({})", method.name, method.param_types.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParsingConfig;

    fn fixture() -> (tempfile::TempDir, ResolutionContext, JavaParser) {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("src/com/example");
        std::fs::create_dir_all(&pkg).unwrap();

        std::fs::write(
            pkg.join("Worker.java"),
            "package com.example;\n\
             public class Worker {\n\
             \tpublic void run() {}\n\
             \tpublic void run(int times) {}\n\
             \tpublic static void log(String... parts) {}\n\
             }\n",
        )
        .unwrap();
        std::fs::write(
            pkg.join("Driver.java"),
            "package com.example;\n\
             public class Driver {\n\
             \tvoid drive() { new Worker().run(); }\n\
             }\n",
        )
        .unwrap();

        let mut parser = JavaParser::new(&ParsingConfig { max_file_size: 1024 * 1024 }).unwrap();
        let mut roots = HashSet::new();
        roots.insert(dir.path().join("src"));
        let context = ResolutionContext::build(&roots, &mut parser).unwrap();

        (dir, context, parser)
    }

    fn only_call(parser: &mut JavaParser, source: &str) -> (SourceUnit, CallExpr) {
        let unit = parser
            .parse_source(source, Path::new("/virtual/com/example/T.java"))
            .unwrap();
        let call = unit.calls[0].clone();
        (unit, call)
    }

    #[test]
    fn context_indexes_conforming_files_only() {
        let (dir, context, mut parser) = fixture();
        assert_eq!(context.type_count(), 2);

        // Wrong directory for its declared package: invisible to resolution
        std::fs::write(
            dir.path().join("src/Stray.java"),
            "package com.example;\npublic class Stray { void s() {} }\n",
        )
        .unwrap();
        let mut roots = HashSet::new();
        roots.insert(dir.path().join("src"));
        let rebuilt = ResolutionContext::build(&roots, &mut parser).unwrap();
        assert_eq!(rebuilt.type_count(), 2);
    }

    #[test]
    fn resolves_instance_creation_receiver() {
        let (_dir, context, mut parser) = fixture();
        let (unit, call) = only_call(
            &mut parser,
            "package com.example;\nclass T { void t() { new Worker().run(); } }\n",
        );

        match resolve(&call, &unit, &context) {
            Resolution::Resolved(m) => {
                assert_eq!(m.type_name, "com.example.Worker");
                assert_eq!(m.signature, "run()");
                assert_eq!(m.qualified_signature, "com.example.Worker.run()");
                assert!(m.file.ends_with("Worker.java"));
            }
            other => panic!("expected Resolved, got {:?}", other),
        }
    }

    #[test]
    fn resolves_variable_receiver_by_declared_type() {
        let (_dir, context, mut parser) = fixture();
        let (unit, call) = only_call(
            &mut parser,
            "package com.example;\nclass T { void t(Worker w) { w.run(3); } }\n",
        );

        match resolve(&call, &unit, &context) {
            Resolution::Resolved(m) => assert_eq!(m.signature, "run(int)"),
            other => panic!("expected Resolved, got {:?}", other),
        }
    }

    #[test]
    fn resolves_static_call_and_varargs_arity() {
        let (_dir, context, mut parser) = fixture();
        let (unit, call) = only_call(
            &mut parser,
            "package com.example;\nclass T { void t() { Worker.log(\"a\", \"b\", \"c\"); } }\n",
        );

        match resolve(&call, &unit, &context) {
            Resolution::Resolved(m) => assert_eq!(m.signature, "log(String...)"),
            other => panic!("expected Resolved, got {:?}", other),
        }
    }

    #[test]
    fn resolves_unqualified_call_against_enclosing_type() {
        let (_dir, context, mut parser) = fixture();
        let unit = parser
            .parse_source(
                "package com.example;\nclass Worker2 { void a() { b(); } void b() {} }\n",
                Path::new("/virtual/Worker2.java"),
            )
            .unwrap();
        let call = unit.calls[0].clone();

        // Worker2 is not indexed (parsed from memory), enclosing lookup
        // goes through the context and misses
        assert!(matches!(resolve(&call, &unit, &context), Resolution::Unresolved));

        // Against an indexed type the same shape binds
        let (unit, call) = only_call(
            &mut parser,
            "package com.example;\nclass Driver2 { void t(Worker w) { w.run(); } }\n",
        );
        assert!(matches!(resolve(&call, &unit, &context), Resolution::Resolved(_)));
    }

    #[test]
    fn standard_library_calls_are_external() {
        let (_dir, context, mut parser) = fixture();
        let (unit, call) = only_call(
            &mut parser,
            "package com.example;\nclass T { void t() { String.valueOf(1); } }\n",
        );

        assert!(matches!(resolve(&call, &unit, &context), Resolution::External));
    }

    #[test]
    fn imported_platform_type_is_external() {
        let (_dir, context, mut parser) = fixture();
        let (unit, call) = only_call(
            &mut parser,
            "package com.example;\nimport java.util.Collections;\n\
             class T { void t() { Collections.shuffle(null); } }\n",
        );

        assert!(matches!(resolve(&call, &unit, &context), Resolution::External));
    }

    #[test]
    fn unknown_receiver_and_arity_mismatch_are_unresolved() {
        let (_dir, context, mut parser) = fixture();

        let (unit, call) = only_call(
            &mut parser,
            "package com.example;\nclass T { void t(Mystery m) { m.run(); } }\n",
        );
        assert!(matches!(resolve(&call, &unit, &context), Resolution::Unresolved));

        // run(int, int) exists under no declared arity
        let (unit, call) = only_call(
            &mut parser,
            "package com.example;\nclass T { void t(Worker w) { w.run(1, 2); } }\n",
        );
        assert!(matches!(resolve(&call, &unit, &context), Resolution::Unresolved));
    }

    #[test]
    fn chained_receiver_is_unresolved() {
        let (_dir, context, mut parser) = fixture();
        let unit = parser
            .parse_source(
                "package com.example;\nclass T { Worker make() { return null; }\n\
                 void t() { make().run(); } }\n",
                Path::new("/virtual/com/example/T.java"),
            )
            .unwrap();

        let chained = unit.calls.iter().find(|c| c.name == "run").unwrap();
        assert!(matches!(resolve(chained, &unit, &context), Resolution::Unresolved));
    }
}
