use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tree_sitter::{Node, Parser};

use crate::config::ParsingConfig;
use crate::error::{ExtractorError, Result};

/// A source position range, 1-based lines and columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRange {
    pub begin_line: usize,
    pub begin_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

impl SourceRange {
    /// Convert a tree-sitter node position to 1-based line/column,
    /// end column inclusive of the last character.
    fn from_node(node: Node) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self {
            begin_line: start.row + 1,
            begin_col: start.column + 1,
            end_line: end.row + 1,
            end_col: end.column,
        }
    }
}

/// An import declaration in a source file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Import {
    /// Imported path without the trailing `.*`, e.g. `com.example.Util`
    pub path: String,
    pub is_wildcard: bool,
    pub is_static: bool,
}

/// A method declaration, as found in a type body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,

    /// Declared parameter types, source text as written
    pub param_types: Vec<String>,

    /// Whether the last parameter is a varargs parameter
    pub is_varargs: bool,

    /// Range of the whole declaration, signature through body
    pub range: SourceRange,
}

/// A class, interface or enum declaration with its methods
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    pub methods: Vec<MethodDecl>,
    pub range: SourceRange,

    /// Whether this type is declared inside another type
    pub is_nested: bool,
}

/// The syntactic shape of a call's receiver expression.
///
/// Only shapes the resolver knows how to bind are distinguished; everything
/// else is `Other` and resolves to nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receiver {
    /// Unqualified call: `helper()`
    None,
    /// Explicit this: `this.helper()`
    This,
    /// Fresh instance: `new Worker().run()` carries the created type name
    New(String),
    /// Identifier receiver: a variable, field or class name
    Ident(String),
    /// Anything else (chained calls, literals, array access, ...)
    Other,
}

/// A method invocation expression found in a source file
#[derive(Debug, Clone)]
pub struct CallExpr {
    /// Simple name of the invoked method
    pub name: String,

    pub receiver: Receiver,
    pub arg_count: usize,
    pub range: SourceRange,

    /// First line of the call expression text, unescaped
    pub call_text: String,

    /// Simple name of the type declaration enclosing the call site
    pub enclosing_type: Option<String>,
}

/// Parse result for one Java source file
#[derive(Debug, Clone)]
pub struct SourceUnit {
    /// Absolute file path
    pub path: PathBuf,

    /// Declared package identifier, e.g. `com.example.core`
    pub package: Option<String>,

    pub imports: Vec<Import>,
    pub types: Vec<TypeDecl>,

    /// Best-effort variable/field/parameter name to declared type table
    pub var_types: HashMap<String, String>,

    pub calls: Vec<CallExpr>,
}

impl SourceUnit {
    /// Simple names of every method declared anywhere in this file
    pub fn method_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.types
            .iter()
            .flat_map(|t| t.methods.iter())
            .map(|m| m.name.as_str())
    }
}

/// Java source parser built on Tree-sitter
pub struct JavaParser {
    parser: Parser,
    max_file_size: usize,
}

impl JavaParser {
    pub fn new(config: &ParsingConfig) -> Result<Self> {
        let mut parser = Parser::new();
        let java_language = tree_sitter_java::language();
        parser.set_language(&java_language)
            .map_err(|e| ExtractorError::Parser(format!("Failed to set Java language: {}", e)))?;

        Ok(Self {
            parser,
            max_file_size: config.max_file_size,
        })
    }

    /// Parse a single source file from disk
    pub fn parse_file<P: AsRef<Path>>(&mut self, file_path: P) -> Result<SourceUnit> {
        let path = file_path.as_ref();
        let source = std::fs::read_to_string(path)?;

        if source.len() > self.max_file_size {
            return Err(ExtractorError::Parser(
                format!("File {} exceeds maximum size limit", path.display())
            ));
        }

        self.parse_source(&source, path)
    }

    /// Parse in-memory source text, attributing it to `path`
    pub fn parse_source(&mut self, source: &str, path: &Path) -> Result<SourceUnit> {
        let tree = self.parser.parse(source, None)
            .ok_or_else(|| ExtractorError::Parser(
                format!("Failed to parse {}", path.display())
            ))?;

        let mut unit = SourceUnit {
            path: path.to_path_buf(),
            package: None,
            imports: Vec::new(),
            types: Vec::new(),
            var_types: HashMap::new(),
            calls: Vec::new(),
        };

        self.collect_items(tree.root_node(), source, None, &mut unit);

        Ok(unit)
    }

    /// Walk the AST collecting declarations, variable types and call sites.
    ///
    /// `enclosing` indexes into `unit.types` and names the innermost type
    /// declaration currently open.
    fn collect_items(&self, node: Node, source: &str, enclosing: Option<usize>, unit: &mut SourceUnit) {
        let mut cursor = node.walk();

        for child in node.children(&mut cursor) {
            match child.kind() {
                "package_declaration" => {
                    unit.package = self.parse_package(child, source);
                }
                "import_declaration" => {
                    if let Some(import) = self.parse_import(child, source) {
                        unit.imports.push(import);
                    }
                }
                "class_declaration" | "interface_declaration" | "enum_declaration" => {
                    if let Some(name_node) = child.child_by_field_name("name") {
                        unit.types.push(TypeDecl {
                            name: self.node_text(name_node, source),
                            methods: Vec::new(),
                            range: SourceRange::from_node(child),
                            is_nested: enclosing.is_some(),
                        });
                        let idx = unit.types.len() - 1;
                        self.collect_items(child, source, Some(idx), unit);
                    }
                }
                "method_declaration" => {
                    if let Some(method) = self.parse_method(child, source) {
                        if let Some(idx) = enclosing {
                            unit.types[idx].methods.push(method);
                        }
                    }
                    // Method bodies contain calls and local variables
                    self.collect_items(child, source, enclosing, unit);
                }
                "method_invocation" => {
                    if let Some(call) = self.parse_call(child, source, enclosing, unit) {
                        unit.calls.push(call);
                    }
                    // Receivers and arguments can hold further invocations
                    self.collect_items(child, source, enclosing, unit);
                }
                "formal_parameter" | "local_variable_declaration" | "field_declaration" => {
                    self.record_var_types(child, source, unit);
                    self.collect_items(child, source, enclosing, unit);
                }
                _ => {
                    self.collect_items(child, source, enclosing, unit);
                }
            }
        }
    }

    /// Extract the package identifier from a `package_declaration` node
    fn parse_package(&self, node: Node, source: &str) -> Option<String> {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "scoped_identifier" || child.kind() == "identifier" {
                return Some(self.node_text(child, source));
            }
        }
        None
    }

    /// Parse an `import_declaration` from its source text
    fn parse_import(&self, node: Node, source: &str) -> Option<Import> {
        let text = self.node_text(node, source);
        let mut rest = text.trim().strip_prefix("import")?.trim();

        let is_static = if let Some(stripped) = rest.strip_prefix("static ") {
            rest = stripped.trim();
            true
        } else {
            false
        };

        let rest = rest.trim_end_matches(';').trim();
        let (path, is_wildcard) = match rest.strip_suffix(".*") {
            Some(base) => (base, true),
            None => (rest, false),
        };

        if path.is_empty() {
            return None;
        }

        Some(Import {
            path: path.to_string(),
            is_wildcard,
            is_static,
        })
    }

    /// Parse a `method_declaration` node into a `MethodDecl`
    fn parse_method(&self, node: Node, source: &str) -> Option<MethodDecl> {
        let name_node = node.child_by_field_name("name")?;
        let name = self.node_text(name_node, source);

        let mut param_types = Vec::new();
        let mut is_varargs = false;

        if let Some(params_node) = node.child_by_field_name("parameters") {
            let mut cursor = params_node.walk();
            for param in params_node.children(&mut cursor) {
                match param.kind() {
                    "formal_parameter" => {
                        if let Some(type_node) = param.child_by_field_name("type") {
                            param_types.push(self.node_text(type_node, source));
                        }
                    }
                    "spread_parameter" => {
                        // Varargs: `String... args`
                        let text = self.node_text(param, source);
                        let type_text = text.split("...").next().unwrap_or("").trim();
                        param_types.push(format!("{}...", type_text));
                        is_varargs = true;
                    }
                    _ => {}
                }
            }
        }

        Some(MethodDecl {
            name,
            param_types,
            is_varargs,
            range: SourceRange::from_node(node),
        })
    }

    /// Parse a `method_invocation` node into a `CallExpr`
    fn parse_call(&self, node: Node, source: &str, enclosing: Option<usize>, unit: &SourceUnit) -> Option<CallExpr> {
        let name_node = node.child_by_field_name("name")?;
        let name = self.node_text(name_node, source);

        let receiver = match node.child_by_field_name("object") {
            None => Receiver::None,
            Some(obj) => match obj.kind() {
                "this" => Receiver::This,
                "identifier" => Receiver::Ident(self.node_text(obj, source)),
                "object_creation_expression" => match obj.child_by_field_name("type") {
                    Some(type_node) => {
                        Receiver::New(simple_type_name(&self.node_text(type_node, source)))
                    }
                    None => Receiver::Other,
                },
                "field_access" => self.parse_field_access_receiver(obj, source),
                _ => Receiver::Other,
            },
        };

        let arg_count = node
            .child_by_field_name("arguments")
            .map(|args| args.named_child_count())
            .unwrap_or(0);

        let full_text = self.node_text(node, source);
        let call_text = full_text
            .lines()
            .next()
            .unwrap_or_default()
            .to_string();

        Some(CallExpr {
            name,
            receiver,
            arg_count,
            range: SourceRange::from_node(node),
            call_text,
            enclosing_type: enclosing.map(|idx| unit.types[idx].name.clone()),
        })
    }

    /// `this.field.m()` binds like a plain field receiver; anything deeper is opaque
    fn parse_field_access_receiver(&self, node: Node, source: &str) -> Receiver {
        let object = node.child_by_field_name("object");
        let field = node.child_by_field_name("field");

        match (object, field) {
            (Some(obj), Some(f)) if obj.kind() == "this" && f.kind() == "identifier" => {
                Receiver::Ident(self.node_text(f, source))
            }
            _ => Receiver::Other,
        }
    }

    /// Record declared variable types from parameter, local and field declarations
    fn record_var_types(&self, node: Node, source: &str, unit: &mut SourceUnit) {
        let Some(type_node) = node.child_by_field_name("type") else {
            return;
        };
        let type_name = simple_type_name(&self.node_text(type_node, source));
        if type_name.is_empty() {
            return;
        }

        match node.kind() {
            "formal_parameter" => {
                if let Some(name_node) = node.child_by_field_name("name") {
                    unit.var_types.insert(self.node_text(name_node, source), type_name);
                }
            }
            "local_variable_declaration" | "field_declaration" => {
                // One declaration can introduce several variables
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if child.kind() == "variable_declarator" {
                        if let Some(name_node) = child.child_by_field_name("name") {
                            unit.var_types
                                .insert(self.node_text(name_node, source), type_name.clone());
                        }
                    }
                }
            }
            _ => {}
        }
    }

    /// Extract text content of a node
    fn node_text(&self, node: Node, source: &str) -> String {
        source[node.byte_range()].to_string()
    }
}

/// Reduce a declared type to its simple class name: strip generic
/// arguments, array brackets and any qualifying package prefix.
pub fn simple_type_name(declared: &str) -> String {
    let base = declared.split('<').next().unwrap_or(declared);
    let base = base.trim().trim_end_matches("[]").trim();
    base.rsplit('.').next().unwrap_or(base).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn parse(source: &str) -> SourceUnit {
        let config = ParsingConfig { max_file_size: 1024 * 1024 };
        let mut parser = JavaParser::new(&config).unwrap();
        parser.parse_source(source, Path::new("Test.java")).unwrap()
    }

    #[test]
    fn extracts_package_and_imports() {
        let unit = parse(
            "package com.example.core;\n\
             import java.util.List;\n\
             import static java.util.Arrays.asList;\n\
             import com.example.util.*;\n\
             class A {}\n",
        );

        assert_eq!(unit.package.as_deref(), Some("com.example.core"));
        assert_eq!(unit.imports.len(), 3);
        assert_eq!(unit.imports[0].path, "java.util.List");
        assert!(!unit.imports[0].is_wildcard);
        assert!(unit.imports[1].is_static);
        assert_eq!(unit.imports[2].path, "com.example.util");
        assert!(unit.imports[2].is_wildcard);
    }

    #[test]
    fn extracts_method_declarations_with_params() {
        let unit = parse(
            "class Calc {\n\
             \tint add(int a, int b) { return a + b; }\n\
             \tvoid log(String... parts) {}\n\
             }\n",
        );

        assert_eq!(unit.types.len(), 1);
        let methods = &unit.types[0].methods;
        assert_eq!(methods.len(), 2);
        assert_eq!(methods[0].name, "add");
        assert_eq!(methods[0].param_types, vec!["int", "int"]);
        assert!(!methods[0].is_varargs);
        assert!(methods[1].is_varargs);
        assert_eq!(methods[0].range.begin_line, 2);
    }

    #[test]
    fn extracts_calls_with_receiver_shapes() {
        let unit = parse(
            "class A {\n\
             \tB field;\n\
             \tvoid run(B param) {\n\
             \t\thelper();\n\
             \t\tthis.helper();\n\
             \t\tnew B().go();\n\
             \t\tparam.go();\n\
             \t\tthis.field.go();\n\
             \t\tB.stat();\n\
             \t\tmake().go();\n\
             \t}\n\
             \tvoid helper() {}\n\
             \tB make() { return null; }\n\
             }\n",
        );

        let shapes: Vec<&Receiver> = unit.calls.iter().map(|c| &c.receiver).collect();
        assert!(shapes.contains(&&Receiver::None));
        assert!(shapes.contains(&&Receiver::This));
        assert!(shapes.contains(&&Receiver::New("B".to_string())));
        assert!(shapes.contains(&&Receiver::Ident("param".to_string())));
        assert!(shapes.contains(&&Receiver::Ident("field".to_string())));
        assert!(shapes.contains(&&Receiver::Other));

        // Both the variable and the field map to B
        assert_eq!(unit.var_types.get("param").map(String::as_str), Some("B"));
        assert_eq!(unit.var_types.get("field").map(String::as_str), Some("B"));

        // Every call knows its enclosing type
        assert!(unit.calls.iter().all(|c| c.enclosing_type.as_deref() == Some("A")));
    }

    #[test]
    fn call_ranges_are_one_based() {
        let unit = parse("class A { void f() { g(); } void g() {} }\n");
        let call = unit.calls.iter().find(|c| c.name == "g").unwrap();
        assert_eq!(call.range.begin_line, 1);
        assert_eq!(call.range.begin_col, 22);
        assert_eq!(call.range.end_line, 1);
        assert_eq!(call.call_text, "g()");
    }

    #[test]
    fn nested_calls_are_all_collected() {
        let unit = parse("class A { void f() { outer(inner()); } }\n");
        let names: Vec<&str> = unit.calls.iter().map(|c| c.name.as_str()).collect();
        assert!(names.contains(&"outer"));
        assert!(names.contains(&"inner"));
    }

    #[test]
    fn simple_type_name_strips_decorations() {
        assert_eq!(simple_type_name("List<String>"), "List");
        assert_eq!(simple_type_name("byte[]"), "byte");
        assert_eq!(simple_type_name("com.example.Util"), "Util");
        assert_eq!(simple_type_name("Map<String, List<Integer>>"), "Map");
    }

    #[test]
    fn oversized_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Big.java");
        std::fs::write(&path, "class Big {}".repeat(1000)).unwrap();

        let config = ParsingConfig { max_file_size: 16 };
        let mut parser = JavaParser::new(&config).unwrap();
        assert!(parser.parse_file(&path).is_err());
    }
}
