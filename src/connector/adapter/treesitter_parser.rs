use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Parser, Query, QueryCursor};

use crate::domain::services::LanguageAnalyzer;
use crate::domain::{
    BaseClassRef, CallInfo, ClassInfo, ClassNodeType, DomainError, FileInfo, FunctionInfo,
    FunctionKind, Language,
};

/// Strips surrounding quotes or angle brackets from an import path:
/// `"fmt"` -> `fmt`, `<stdio.h>` -> `stdio.h`.
fn normalize_import_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.len() < 2 {
        return trimmed.to_string();
    }
    if (trimmed.starts_with('"') && trimmed.ends_with('"'))
        || (trimmed.starts_with('\'') && trimmed.ends_with('\''))
    {
        return trimmed[1..trimmed.len() - 1].to_string();
    }
    if trimmed.starts_with('<') && trimmed.ends_with('>') {
        return trimmed[1..trimmed.len() - 1].to_string();
    }
    trimmed.to_string()
}

/// Python built-ins excluded from call resolution (§4.1, §8).
const PYTHON_BUILTINS: &[&str] = &[
    "print", "len", "str", "int", "float", "bool", "list", "dict", "set", "tuple", "range",
    "enumerate", "zip", "map", "filter", "sorted", "reversed", "sum", "min", "max", "abs",
    "round", "open", "input", "isinstance", "issubclass", "super", "type", "object", "repr",
    "format", "hash", "id", "iter", "next", "all", "any", "getattr", "setattr", "hasattr",
    "delattr", "vars", "dir", "callable", "staticmethod", "classmethod", "property",
    "Exception", "ValueError", "TypeError", "KeyError", "IndexError", "StopIteration",
];

fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// Joins a module path and a name with `.`, omitting the dot when the module
/// path is empty (Java with no detected `package` declaration).
fn qualify(module_path: &str, name: &str) -> String {
    if module_path.is_empty() {
        name.to_string()
    } else {
        format!("{module_path}.{name}")
    }
}

fn build_signature(name: &str, param_types: &[String], return_type: &str) -> String {
    format!("{name}({}) -> {return_type}", param_types.join(", "))
}

/// True if `node` is nested anywhere under `ancestor`.
fn is_within(node: Node, ancestor: Node) -> bool {
    let mut cur = node.parent();
    while let Some(p) = cur {
        if p.id() == ancestor.id() {
            return true;
        }
        cur = p.parent();
    }
    false
}

fn collect_descendants<'a>(node: Node<'a>, kinds: &[&str], out: &mut Vec<Node<'a>>) {
    if kinds.contains(&node.kind()) {
        out.push(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_descendants(child, kinds, out);
    }
}

fn first_child_of_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).find(|c| c.kind() == kind)
}

fn first_identifier_text<'a>(node: Node<'a>, source: &'a str) -> Option<&'a str> {
    if node.kind() == "identifier" {
        return Some(node_text(node, source));
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_identifier_text(child, source) {
            return Some(found);
        }
    }
    None
}

fn count_leading_pointer_stars(node: Node) -> usize {
    let mut cur = node;
    let mut count = 0;
    while cur.kind() == "pointer_declarator" {
        count += 1;
        match cur.child_by_field_name("declarator") {
            Some(d) => cur = d,
            None => break,
        }
    }
    count
}

fn contains_kind(node: Node, kind: &str) -> bool {
    if node.kind() == kind {
        return true;
    }
    let mut cursor = node.walk();
    node.children(&mut cursor).any(|c| contains_kind(c, kind))
}

// --- Python -----------------------------------------------------------

fn leftmost_identifier<'a>(node: Node<'a>, source: &'a str) -> &'a str {
    let mut cur = node;
    while cur.kind() == "attribute" {
        match cur.child_by_field_name("object") {
            Some(obj) => cur = obj,
            None => break,
        }
    }
    node_text(cur, source)
}

fn python_param_name<'a>(node: Node<'a>, source: &'a str) -> String {
    match node.kind() {
        "identifier" => node_text(node, source).to_string(),
        "list_splat_pattern" => format!("*{}", first_identifier_text(node, source).unwrap_or("")),
        "dictionary_splat_pattern" => {
            format!("**{}", first_identifier_text(node, source).unwrap_or(""))
        }
        "typed_parameter" | "default_parameter" | "typed_default_parameter" => {
            first_identifier_text(node, source).unwrap_or("").to_string()
        }
        _ => node_text(node, source).to_string(),
    }
}

fn python_param_type(node: Node, source: &str) -> String {
    node.child_by_field_name("type")
        .map(|t| node_text(t, source).to_string())
        .unwrap_or_else(|| "Any".to_string())
}

fn python_params(node: Node, source: &str) -> (Vec<String>, Vec<String>) {
    let mut names = Vec::new();
    let mut types = Vec::new();
    if let Some(params) = node.child_by_field_name("parameters") {
        let mut cursor = params.walk();
        for p in params.named_children(&mut cursor) {
            if p.kind() == "comment" {
                continue;
            }
            names.push(python_param_name(p, source));
            types.push(python_param_type(p, source));
        }
    }
    (names, types)
}

fn literal_arg_type(node: Node, source: &str) -> String {
    match node.kind() {
        "integer" => "int",
        "float" => "float",
        "string" | "concatenated_string" => "str",
        "true" | "false" => "bool",
        "none" => "None",
        "list" => "list",
        "dictionary" => "dict",
        "tuple" => "tuple",
        "set" => "set",
        _ => "Any",
    }
    .to_string()
}

fn python_call_arg_types(call_node: Node, source: &str) -> Vec<String> {
    let Some(args) = call_node.child_by_field_name("arguments") else {
        return Vec::new();
    };
    let mut cursor = args.walk();
    args.named_children(&mut cursor)
        .map(|a| literal_arg_type(a, source))
        .collect()
}

fn python_calls(
    node: Node,
    source: &str,
    imports: &HashMap<String, String>,
    module_path: &str,
    class_name: Option<&str>,
) -> Vec<CallInfo> {
    let mut call_nodes = Vec::new();
    collect_descendants(node, &["call"], &mut call_nodes);

    let mut calls = Vec::new();
    for call_node in call_nodes {
        let Some(func_node) = call_node.child_by_field_name("function") else {
            continue;
        };
        let (name, full_name) = match func_node.kind() {
            "identifier" => {
                let n = node_text(func_node, source).to_string();
                if PYTHON_BUILTINS.contains(&n.as_str()) {
                    continue;
                }
                let full = imports.get(&n).cloned().unwrap_or_else(|| qualify(module_path, &n));
                (n, full)
            }
            "attribute" => {
                let chain_text = node_text(func_node, source);
                let leftmost = leftmost_identifier(func_node, source);
                let rest = &chain_text[leftmost.len()..];
                if leftmost == "self" {
                    let Some(c) = class_name else { continue };
                    (format!("self{rest}"), format!("{}{rest}", qualify(module_path, c)))
                } else if let Some(mapped) = imports.get(leftmost) {
                    (chain_text.to_string(), format!("{mapped}{rest}"))
                } else {
                    (chain_text.to_string(), format!("{}{rest}", qualify(module_path, leftmost)))
                }
            }
            _ => continue,
        };
        let arg_types = python_call_arg_types(call_node, source);
        let signature = format!("{name}({}) -> Any", arg_types.join(", "));
        calls.push(CallInfo::new(name, full_name, signature));
    }
    calls
}

/// Builds the `local_name -> fully_qualified_name` map from the raw text of
/// every `import`/`from ... import ...` statement observed in the file.
fn build_python_imports_map(import_texts: &[String], module_path: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for raw in import_texts {
        let text = raw.trim();
        if let Some(rest) = text.strip_prefix("from ") {
            let Some(import_idx) = rest.find(" import ") else { continue };
            let module_part = rest[..import_idx].trim();
            let names_part = rest[import_idx + " import ".len()..].trim();

            let level = module_part.chars().take_while(|&c| c == '.').count();
            let module_after_dots = module_part.trim_start_matches('.').trim();

            let full_module = if level > 0 {
                let comps: Vec<&str> = module_path.split('.').filter(|s| !s.is_empty()).collect();
                if level > comps.len() {
                    continue; // resolves to empty — boundary case, nothing to map
                }
                let base = comps[..comps.len() - level].join(".");
                if module_after_dots.is_empty() {
                    base
                } else if base.is_empty() {
                    module_after_dots.to_string()
                } else {
                    format!("{base}.{module_after_dots}")
                }
            } else {
                module_after_dots.to_string()
            };

            for name_entry in names_part.split(',') {
                let name_entry = name_entry.trim();
                if name_entry.is_empty() || name_entry == "*" {
                    continue;
                }
                let (orig, alias) = match name_entry.split_once(" as ") {
                    Some((o, a)) => (o.trim(), a.trim()),
                    None => (name_entry, name_entry),
                };
                let full = if full_module.is_empty() {
                    orig.to_string()
                } else {
                    format!("{full_module}.{orig}")
                };
                map.insert(alias.to_string(), full);
            }
        } else if let Some(rest) = text.strip_prefix("import ") {
            for entry in rest.split(',') {
                let entry = entry.trim();
                if entry.is_empty() {
                    continue;
                }
                match entry.split_once(" as ") {
                    Some((m, a)) => {
                        map.insert(a.trim().to_string(), m.trim().to_string());
                    }
                    None => {
                        let local = entry.split('.').next().unwrap_or(entry);
                        map.insert(local.to_string(), entry.to_string());
                    }
                }
            }
        }
    }
    map
}

fn python_base_classes(
    node: Node,
    source: &str,
    module_path: &str,
    imports: &HashMap<String, String>,
) -> Vec<BaseClassRef> {
    let mut out = Vec::new();
    let Some(superclasses) = node.child_by_field_name("superclasses") else {
        return out;
    };
    let mut cursor = superclasses.walk();
    for child in superclasses.named_children(&mut cursor) {
        if child.kind() == "keyword_argument" {
            continue;
        }
        let text = node_text(child, source);
        if matches!(text, "object" | "ABC" | "Protocol") {
            continue;
        }
        let leftmost = leftmost_identifier(child, source);
        let rest = &text[leftmost.len()..];
        let full_name = if let Some(mapped) = imports.get(leftmost) {
            format!("{mapped}{rest}")
        } else {
            format!("{module_path}.{text}")
        };
        let name = full_name.rsplit('.').next().unwrap_or(&full_name).to_string();
        out.push(BaseClassRef::new(name, full_name, ClassNodeType::Class));
    }
    out
}

// --- Java ---------------------------------------------------------------

fn detect_java_package(source: &str) -> Option<String> {
    for line in source.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("package ") {
            let pkg = rest.trim_end_matches(';').trim();
            if !pkg.is_empty() {
                return Some(pkg.to_string());
            }
        }
    }
    None
}

fn java_params(node: Node, source: &str) -> (Vec<String>, Vec<String>) {
    let mut names = Vec::new();
    let mut types = Vec::new();
    if let Some(params) = node.child_by_field_name("parameters") {
        let mut cursor = params.walk();
        for p in params.named_children(&mut cursor) {
            match p.kind() {
                "formal_parameter" => {
                    let ty = p
                        .child_by_field_name("type")
                        .map(|t| node_text(t, source).to_string())
                        .unwrap_or_else(|| "Object".to_string());
                    let name = p
                        .child_by_field_name("name")
                        .map(|n| node_text(n, source).to_string())
                        .unwrap_or_default();
                    names.push(name);
                    types.push(ty);
                }
                "spread_parameter" => {
                    let ty = p
                        .child_by_field_name("type")
                        .map(|t| format!("{}...", node_text(t, source)))
                        .unwrap_or_else(|| "Object...".to_string());
                    names.push(first_identifier_text(p, source).unwrap_or("").to_string());
                    types.push(ty);
                }
                _ => {}
            }
        }
    }
    (names, types)
}

fn java_base_classes(node: Node, source: &str) -> Vec<BaseClassRef> {
    let mut out = Vec::new();
    if let Some(superclass) = node.child_by_field_name("superclass") {
        let text = node_text(superclass, source).trim_start_matches("extends").trim().to_string();
        if !text.is_empty() {
            let simple = text.rsplit(['.', '<']).next().unwrap_or(&text).to_string();
            out.push(BaseClassRef::new(simple, text, ClassNodeType::Class));
        }
    }
    if let Some(interfaces) = node.child_by_field_name("interfaces") {
        let type_list = first_child_of_kind(interfaces, "type_list").unwrap_or(interfaces);
        let mut cursor = type_list.walk();
        for t in type_list.named_children(&mut cursor) {
            let text = node_text(t, source).to_string();
            let simple = text.rsplit(['.', '<']).next().unwrap_or(&text).to_string();
            out.push(BaseClassRef::new(simple, text, ClassNodeType::Interface));
        }
    }
    out
}

// --- Go -------------------------------------------------------------------

fn go_receiver_type_name(node: Node, source: &str) -> Option<String> {
    let receiver = node.child_by_field_name("receiver")?;
    let mut cursor = receiver.walk();
    for p in receiver.named_children(&mut cursor) {
        if p.kind() == "parameter_declaration" {
            if let Some(ty) = p.child_by_field_name("type") {
                return Some(node_text(ty, source).trim_start_matches('*').to_string());
            }
        }
    }
    None
}

fn go_params(node: Node, source: &str) -> (Vec<String>, Vec<String>) {
    let mut names = Vec::new();
    let mut types = Vec::new();
    let Some(params) = node.child_by_field_name("parameters") else {
        return (names, types);
    };
    let mut cursor = params.walk();
    for p in params.named_children(&mut cursor) {
        match p.kind() {
            "parameter_declaration" => {
                let ty_text = p
                    .child_by_field_name("type")
                    .map(|t| node_text(t, source).to_string())
                    .unwrap_or_else(|| "interface{}".to_string());
                let mut name_cursor = p.walk();
                let name_nodes: Vec<Node> = p.children_by_field_name("name", &mut name_cursor).collect();
                if name_nodes.is_empty() {
                    names.push(String::new());
                    types.push(ty_text);
                } else {
                    for n in name_nodes {
                        names.push(node_text(n, source).to_string());
                        types.push(ty_text.clone());
                    }
                }
            }
            "variadic_parameter_declaration" => {
                let ty_text = p
                    .child_by_field_name("type")
                    .map(|t| format!("...{}", node_text(t, source)))
                    .unwrap_or_else(|| "...interface{}".to_string());
                let name = p
                    .child_by_field_name("name")
                    .map(|n| node_text(n, source).to_string())
                    .unwrap_or_default();
                names.push(name);
                types.push(ty_text);
            }
            _ => {}
        }
    }
    (names, types)
}

fn go_field_attributes(field_decl: Node, source: &str) -> Vec<String> {
    let ty_text = field_decl
        .child_by_field_name("type")
        .map(|t| node_text(t, source).to_string())
        .unwrap_or_else(|| "interface{}".to_string());
    let mut cursor = field_decl.walk();
    let names: Vec<Node> = field_decl.children_by_field_name("name", &mut cursor).collect();
    if names.is_empty() {
        vec![format!("{ty_text}:{ty_text}")]
    } else {
        names.into_iter().map(|n| format!("{}:{}", node_text(n, source), ty_text)).collect()
    }
}

// --- C / C++ ---------------------------------------------------------------

fn find_function_declarator(node: Node) -> Option<Node> {
    if node.kind() == "function_declarator" {
        return Some(node);
    }
    let mut cursor = node.walk();
    node.children(&mut cursor).find_map(find_function_declarator)
}

fn c_return_type(node: Node, source: &str) -> Option<String> {
    let base = node.child_by_field_name("type")?;
    let mut ty = node_text(base, source).to_string();
    if let Some(declarator) = node.child_by_field_name("declarator") {
        ty.push_str(&"*".repeat(count_leading_pointer_stars(declarator)));
    }
    Some(ty)
}

fn c_params(node: Node, source: &str) -> (Vec<String>, Vec<String>) {
    let mut names = Vec::new();
    let mut types = Vec::new();
    let Some(declarator) = node.child_by_field_name("declarator") else {
        return (names, types);
    };
    let func_declarator = find_function_declarator(declarator).unwrap_or(declarator);
    let Some(params) = func_declarator.child_by_field_name("parameters") else {
        return (names, types);
    };
    let mut cursor = params.walk();
    for p in params.named_children(&mut cursor) {
        match p.kind() {
            "parameter_declaration" => {
                let base_ty = p
                    .child_by_field_name("type")
                    .map(|t| node_text(t, source).to_string())
                    .unwrap_or_else(|| "int".to_string());
                if let Some(decl) = p.child_by_field_name("declarator") {
                    let stars = count_leading_pointer_stars(decl);
                    let ident = first_identifier_text(decl, source).unwrap_or("");
                    names.push(ident.to_string());
                    types.push(format!("{base_ty}{}", "*".repeat(stars)));
                } else {
                    names.push(String::new());
                    types.push(base_ty);
                }
            }
            "variadic_parameter" => {
                names.push("...".to_string());
                types.push("...".to_string());
            }
            _ => {}
        }
    }
    (names, types)
}

fn c_field_attribute(field_decl: Node, source: &str) -> Option<String> {
    let base_ty = field_decl.child_by_field_name("type")?;
    let base_ty_text = node_text(base_ty, source).to_string();
    let declarator = field_decl.child_by_field_name("declarator")?;
    let stars = count_leading_pointer_stars(declarator);
    let ident = first_identifier_text(declarator, source)?;
    Some(format!("{}:{}{}", ident, base_ty_text, "*".repeat(stars)))
}

/// Tree-sitter-backed [`LanguageAnalyzer`]. One instance per supported
/// language, constructed via the named functions below; each carries its own
/// grammar and capture query, but shares the walk/extract/build-IR pipeline
/// since the shape of the work (functions, classes, imports) is identical
/// across grammars — only the per-language helpers above differ.
pub struct TreeSitterAnalyzer {
    language: Language,
    ts_language: tree_sitter::Language,
    query_source: &'static str,
}

impl TreeSitterAnalyzer {
    pub fn python() -> Self {
        Self {
            language: Language::Python,
            ts_language: tree_sitter_python::LANGUAGE.into(),
            query_source: r#"
                (function_definition name: (identifier) @name) @function
                (class_definition name: (identifier) @name) @class
                (import_statement) @import
                (import_from_statement) @import
                "#,
        }
    }

    pub fn java() -> Self {
        Self {
            language: Language::Java,
            ts_language: tree_sitter_java::LANGUAGE.into(),
            query_source: r#"
                (method_declaration name: (identifier) @name) @function
                (constructor_declaration name: (identifier) @name) @function
                (class_declaration name: (identifier) @name) @class
                (interface_declaration name: (identifier) @name) @interface
                (import_declaration) @import
                "#,
        }
    }

    pub fn go() -> Self {
        Self {
            language: Language::Go,
            ts_language: tree_sitter_go::LANGUAGE.into(),
            query_source: r#"
                (function_declaration name: (identifier) @name) @function
                (method_declaration name: (field_identifier) @name) @function
                (type_declaration (type_spec name: (type_identifier) @name type: (struct_type))) @struct
                (type_declaration (type_spec name: (type_identifier) @name type: (interface_type))) @interface
                (import_spec path: (interpreted_string_literal) @import_path) @import
                "#,
        }
    }

    pub fn c() -> Self {
        Self {
            language: Language::C,
            ts_language: tree_sitter_c::LANGUAGE.into(),
            query_source: r#"
                (function_definition declarator: (function_declarator declarator: (identifier) @name)) @function
                (struct_specifier name: (type_identifier) @name) @struct
                (preproc_include path: (_) @import_path) @import
                "#,
        }
    }

    pub fn cpp() -> Self {
        Self {
            language: Language::Cpp,
            ts_language: tree_sitter_cpp::LANGUAGE.into(),
            query_source: r#"
                (function_definition declarator: (function_declarator declarator: (identifier) @name)) @function
                (function_definition declarator: (function_declarator declarator: (field_identifier) @name)) @function
                (class_specifier name: (type_identifier) @name) @class
                (struct_specifier name: (type_identifier) @name) @struct
                (preproc_include path: (_) @import_path) @import
                "#,
        }
    }

    fn analyze_source(&self, file_path: &str, source: &str) -> Result<Option<FileInfo>, DomainError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.ts_language)
            .map_err(|e| DomainError::internal(format!("Failed to set grammar: {}", e)))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| DomainError::internal(format!("Failed to parse {}", file_path)))?;

        let query = Query::new(&self.ts_language, self.query_source)
            .map_err(|e| DomainError::internal(format!("Invalid query for {:?}: {}", self.language, e)))?;

        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, tree.root_node(), source.as_bytes());

        let mut file_info = FileInfo::new(file_path, self.language);

        let mut function_nodes: Vec<Node> = Vec::new();
        let mut class_nodes: Vec<(Node, ClassNodeType)> = Vec::new();
        let mut import_texts: Vec<String> = Vec::new();

        while let Some(m) = matches.next() {
            for capture in m.captures {
                let capture_name = query.capture_names()[capture.index as usize];
                let node = capture.node;
                match capture_name {
                    "function" => function_nodes.push(node),
                    "class" => class_nodes.push((node, ClassNodeType::Class)),
                    "struct" => class_nodes.push((node, ClassNodeType::Struct)),
                    "interface" => class_nodes.push((node, ClassNodeType::Interface)),
                    "import_path" => {
                        let text = node_text(node, source);
                        file_info.imports.push(normalize_import_path(text));
                    }
                    "import" if !matches!(self.language, Language::Go | Language::C | Language::Cpp) => {
                        let text = node_text(node, source).trim().trim_end_matches(';').to_string();
                        import_texts.push(text.clone());
                        file_info.imports.push(text);
                    }
                    _ => {}
                }
            }
        }

        let module_path = match self.language {
            Language::Java => detect_java_package(source).unwrap_or_default(),
            _ => file_info.module_path(),
        };

        let imports_map = if matches!(self.language, Language::Python) {
            build_python_imports_map(&import_texts, &module_path)
        } else {
            HashMap::new()
        };

        for (node, node_type) in &class_nodes {
            if let Some(class_info) =
                self.build_class(*node, source, file_path, &module_path, *node_type, &imports_map)
            {
                file_info.classes.push(class_info);
            }
        }
        file_info.classes.retain(|c| !c.name.starts_with('_'));

        let mut top_level: Vec<FunctionInfo> = Vec::new();
        for node in &function_nodes {
            if matches!(self.language, Language::Go) {
                if let Some(receiver_ty) = go_receiver_type_name(*node, source) {
                    if let Some(class) = file_info.classes.iter_mut().find(|c| c.name == receiver_ty) {
                        let class_name = class.name.clone();
                        if let Some(method) =
                            self.build_function(*node, source, file_path, &module_path, Some(&class_name), &imports_map)
                        {
                            class.methods.push(method);
                        }
                        continue;
                    }
                }
            } else if class_nodes.iter().any(|(cn, _)| is_within(*node, *cn)) {
                continue;
            }

            if let Some(info) = self.build_function(*node, source, file_path, &module_path, None, &imports_map) {
                top_level.push(info);
            }
        }
        top_level.retain(|f| !f.name.starts_with('_'));
        file_info.functions = top_level;

        if file_info.functions.is_empty() && file_info.classes.is_empty() && file_info.imports.is_empty() {
            return Ok(None);
        }
        Ok(Some(file_info))
    }

    fn build_function(
        &self,
        node: Node,
        source: &str,
        file_path: &str,
        module_path: &str,
        class_name: Option<&str>,
        imports: &HashMap<String, String>,
    ) -> Option<FunctionInfo> {
        let name_node = node.child_by_field_name("name")?;
        let name = node_text(name_node, source).to_string();
        let full_name = match class_name {
            Some(c) => format!("{}.{}", qualify(module_path, c), name),
            None => qualify(module_path, &name),
        };
        let kind = if class_name.is_some() {
            FunctionKind::Method
        } else {
            FunctionKind::Function
        };
        let source_code = node_text(node, source).to_string();
        let start_line = node.start_position().row as u32 + 1;
        let end_line = node.end_position().row as u32 + 1;

        let (params, param_types, return_type) = match self.language {
            Language::Python => {
                let (p, t) = python_params(node, source);
                let rt = node
                    .child_by_field_name("return_type")
                    .map(|n| node_text(n, source).to_string())
                    .unwrap_or_else(|| "Any".to_string());
                (p, t, rt)
            }
            Language::Java => {
                let (p, t) = java_params(node, source);
                let rt = if node.kind() == "constructor_declaration" {
                    class_name.unwrap_or("void").to_string()
                } else {
                    node.child_by_field_name("type")
                        .map(|n| node_text(n, source).to_string())
                        .unwrap_or_else(|| "void".to_string())
                };
                (p, t, rt)
            }
            Language::Go => {
                let (p, t) = go_params(node, source);
                let rt = node
                    .child_by_field_name("result")
                    .map(|n| node_text(n, source).to_string())
                    .unwrap_or_else(|| "void".to_string());
                (p, t, rt)
            }
            Language::C | Language::Cpp => {
                let (p, t) = c_params(node, source);
                let rt = c_return_type(node, source).unwrap_or_else(|| "void".to_string());
                (p, t, rt)
            }
            Language::Unknown => (Vec::new(), Vec::new(), "Any".to_string()),
        };

        let signature = build_signature(&name, &param_types, &return_type);

        let mut info = FunctionInfo::new(
            name,
            full_name,
            signature,
            kind,
            file_path,
            source_code,
            start_line,
            end_line,
        );
        info.class_name = class_name.map(|c| c.to_string());
        info.params = params;
        info.param_types = param_types;
        info.returns = vec![return_type.clone()];
        info.return_types = vec![return_type];

        if matches!(self.language, Language::Python) {
            info.calls = python_calls(node, source, imports, module_path, class_name);
        }

        Some(info)
    }

    fn build_class(
        &self,
        node: Node,
        source: &str,
        file_path: &str,
        module_path: &str,
        node_type: ClassNodeType,
        imports: &HashMap<String, String>,
    ) -> Option<ClassInfo> {
        let name_node = node.child_by_field_name("name")?;
        let name = node_text(name_node, source).to_string();
        let full_name = qualify(module_path, &name);
        let source_code = node_text(node, source).to_string();
        let start_line = node.start_position().row as u32 + 1;
        let end_line = node.end_position().row as u32 + 1;

        let mut class_info = ClassInfo::new(
            name.clone(),
            full_name,
            file_path,
            node_type,
            source_code,
            start_line,
            end_line,
        );

        match self.language {
            Language::Go => {
                let mut field_nodes = Vec::new();
                collect_descendants(node, &["field_declaration"], &mut field_nodes);
                for f in field_nodes {
                    class_info.attributes.extend(go_field_attributes(f, source));
                }
                if node_type == ClassNodeType::Interface {
                    let mut method_nodes = Vec::new();
                    collect_descendants(node, &["method_elem", "method_spec"], &mut method_nodes);
                    for m in method_nodes {
                        if let Some(method) =
                            self.build_function(m, source, file_path, module_path, Some(&name), imports)
                        {
                            class_info.methods.push(method);
                        }
                    }
                }
            }
            _ => {
                if let Some(body) = node.child_by_field_name("body") {
                    let mut cursor = body.walk();
                    for child in body.children(&mut cursor) {
                        match child.kind() {
                            "function_definition" | "method_declaration" | "constructor_declaration" => {
                                if let Some(method) = self.build_function(
                                    child,
                                    source,
                                    file_path,
                                    module_path,
                                    Some(&name),
                                    imports,
                                ) {
                                    class_info.methods.push(method);
                                }
                            }
                            "field_declaration" if !contains_kind(child, "function_declarator") => {
                                if let Some(attr) = c_field_attribute(child, source) {
                                    class_info.attributes.push(attr);
                                }
                            }
                            _ => {}
                        }
                    }
                }
            }
        }

        class_info.base_classes = match self.language {
            Language::Python => python_base_classes(node, source, module_path, imports),
            Language::Java => java_base_classes(node, source),
            _ => Vec::new(),
        };

        Some(class_info)
    }
}

#[async_trait]
impl LanguageAnalyzer for TreeSitterAnalyzer {
    fn language(&self) -> Language {
        self.language
    }

    async fn analyze_file(
        &self,
        base_path: &str,
        file_path: &str,
    ) -> Result<Option<FileInfo>, DomainError> {
        let full_path = Path::new(base_path).join(file_path);
        let source = tokio::fs::read_to_string(&full_path)
            .await
            .map_err(|e| DomainError::internal(format!("Failed to read {}: {}", full_path.display(), e)))?;

        let relative = file_path.replace('\\', "/");
        self.analyze_source(&relative, &source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn python_analyzer_extracts_functions_and_classes() {
        let analyzer = TreeSitterAnalyzer::python();
        let source = "import os\n\nclass Greeter:\n    def greet(self):\n        return 1\n\ndef top():\n    return 2\n";
        let file = analyzer.analyze_source("pkg/m.py", source).unwrap().unwrap();
        assert_eq!(file.classes.len(), 1);
        assert_eq!(file.classes[0].methods.len(), 1);
        assert_eq!(file.functions.len(), 1);
        assert!(file.imports.iter().any(|i| i.contains("os")));
    }

    #[test]
    fn python_function_signature_and_params_use_type_annotations() {
        let analyzer = TreeSitterAnalyzer::python();
        let source = "def calculate_sum(a: int, b: int) -> int:\n    return a + b\n";
        let file = analyzer.analyze_source("pkg/m.py", source).unwrap().unwrap();
        let f = &file.functions[0];
        assert_eq!(f.name, "calculate_sum");
        assert_eq!(f.full_name, "pkg.m.calculate_sum");
        assert_eq!(f.signature, "calculate_sum(int, int) -> int");
        assert_eq!(f.params, vec!["a", "b"]);
        assert_eq!(f.param_types, vec!["int", "int"]);
        assert_eq!(f.return_types, vec!["int"]);
        assert_eq!(f.start_line, 1);
    }

    #[test]
    fn python_method_calls_resolve_to_class_qualified_names() {
        let analyzer = TreeSitterAnalyzer::python();
        let source = "class Calculator:\n    def add(self, a, b):\n        return a + b\n    def multiply(self, a, b):\n        return a * b\n    def calculate(self, a, b):\n        self.add(a, b)\n        self.multiply(a, b)\n";
        let file = analyzer.analyze_source("pkg/m.py", source).unwrap().unwrap();
        assert_eq!(file.classes.len(), 1);
        assert_eq!(file.classes[0].methods.len(), 3);
        let calculate = file.classes[0].methods.iter().find(|m| m.name == "calculate").unwrap();
        assert_eq!(calculate.calls.len(), 2);
        assert!(calculate.calls.iter().any(|c| c.full_name.ends_with(".Calculator.add")));
        assert!(calculate.calls.iter().any(|c| c.full_name.ends_with(".Calculator.multiply")));
    }

    #[test]
    fn python_base_class_resolves_through_import_alias() {
        let analyzer = TreeSitterAnalyzer::python();
        let source = "from app.base import BaseClass as Base\n\nclass MyClass(Base):\n    pass\n";
        let file = analyzer.analyze_source("pkg/m.py", source).unwrap().unwrap();
        let base = &file.classes[0].base_classes[0];
        assert_eq!(base.name, "BaseClass");
        assert_eq!(base.full_name, "app.base.BaseClass");
        assert_eq!(base.node_type, ClassNodeType::Class);
    }

    #[test]
    fn python_relative_import_resolves_against_module_path() {
        let analyzer = TreeSitterAnalyzer::python();
        let source = "from ..pkg import x\n\ndef f():\n    x()\n";
        let file = analyzer.analyze_source("a/b/c.py", source).unwrap().unwrap();
        let f = &file.functions[0];
        assert_eq!(f.calls[0].full_name, "a.pkg.x");
    }

    #[test]
    fn python_underscore_prefixed_top_level_items_are_skipped() {
        let analyzer = TreeSitterAnalyzer::python();
        let source = "def _hidden():\n    return 1\n\ndef visible():\n    return 2\n";
        let file = analyzer.analyze_source("pkg/m.py", source).unwrap().unwrap();
        assert_eq!(file.functions.len(), 1);
        assert_eq!(file.functions[0].name, "visible");
    }

    #[test]
    fn python_method_visibility_is_never_filtered() {
        let analyzer = TreeSitterAnalyzer::python();
        let source = "class C:\n    def _private(self):\n        return 1\n";
        let file = analyzer.analyze_source("pkg/m.py", source).unwrap().unwrap();
        assert_eq!(file.classes[0].methods.len(), 1);
    }

    #[test]
    fn go_analyzer_extracts_functions() {
        let analyzer = TreeSitterAnalyzer::go();
        let source = "package main\n\nimport \"fmt\"\n\nfunc main() {\n\tfmt.Println(\"hi\")\n}\n";
        let file = analyzer.analyze_source("main.go", source).unwrap().unwrap();
        assert_eq!(file.functions.len(), 1);
        assert!(file.imports.iter().any(|i| i == "fmt"));
    }

    #[test]
    fn go_struct_methods_are_associated_by_receiver() {
        let analyzer = TreeSitterAnalyzer::go();
        let source = "package shapes\n\ntype Rect struct {\n\tWidth int\n\tHeight int\n}\n\nfunc (r *Rect) Area() int {\n\treturn r.Width * r.Height\n}\n";
        let file = analyzer.analyze_source("shapes.go", source).unwrap().unwrap();
        assert_eq!(file.functions.len(), 0);
        assert_eq!(file.classes.len(), 1);
        assert_eq!(file.classes[0].methods.len(), 1);
        assert_eq!(file.classes[0].methods[0].name, "Area");
        assert!(file.classes[0].attributes.contains(&"Width:int".to_string()));
        assert!(file.classes[0].attributes.contains(&"Height:int".to_string()));
    }

    #[test]
    fn go_interface_methods_are_extracted() {
        let analyzer = TreeSitterAnalyzer::go();
        let source = "package shapes\n\ntype Shape interface {\n\tArea() int\n}\n";
        let file = analyzer.analyze_source("shapes.go", source).unwrap().unwrap();
        assert_eq!(file.classes.len(), 1);
        assert_eq!(file.classes[0].node_type, ClassNodeType::Interface);
        assert_eq!(file.classes[0].methods.len(), 1);
        assert_eq!(file.classes[0].methods[0].name, "Area");
    }

    #[test]
    fn java_package_qualifies_full_names() {
        let analyzer = TreeSitterAnalyzer::java();
        let source = "package com.example;\n\npublic class Greeter {\n    public String greet() {\n        return \"hi\";\n    }\n}\n";
        let file = analyzer.analyze_source("com/example/Greeter.java", source).unwrap().unwrap();
        assert_eq!(file.classes[0].full_name, "com.example.Greeter");
        assert_eq!(file.classes[0].methods[0].full_name, "com.example.Greeter.greet");
    }

    #[test]
    fn java_without_package_omits_leading_dot() {
        let analyzer = TreeSitterAnalyzer::java();
        let source = "public class Greeter {\n    public String greet() {\n        return \"hi\";\n    }\n}\n";
        let file = analyzer.analyze_source("Greeter.java", source).unwrap().unwrap();
        assert_eq!(file.classes[0].full_name, "Greeter");
        assert!(!file.classes[0].full_name.starts_with('.'));
    }

    #[test]
    fn java_distinguishes_implements_from_extends() {
        let analyzer = TreeSitterAnalyzer::java();
        let source = "class Base {}\ninterface Flyable {}\nclass Bird extends Base implements Flyable {\n}\n";
        let file = analyzer.analyze_source("Bird.java", source).unwrap().unwrap();
        let bird = file.classes.iter().find(|c| c.name == "Bird").unwrap();
        assert!(bird.base_classes.iter().any(|b| b.name == "Base" && b.node_type == ClassNodeType::Class));
        assert!(bird.base_classes.iter().any(|b| b.name == "Flyable" && b.node_type == ClassNodeType::Interface));
    }

    #[test]
    fn c_struct_attributes_are_extracted_and_methods_excluded() {
        let analyzer = TreeSitterAnalyzer::c();
        let source = "struct Point {\n    int x;\n    int y;\n};\n";
        let file = analyzer.analyze_source("point.c", source).unwrap().unwrap();
        assert_eq!(file.classes[0].attributes.len(), 2);
        assert!(file.classes[0].attributes.contains(&"x:int".to_string()));
        assert!(file.classes[0].methods.is_empty());
    }

    #[test]
    fn c_function_signature_uses_declared_types() {
        let analyzer = TreeSitterAnalyzer::c();
        let source = "int add(int a, int b) {\n    return a + b;\n}\n";
        let file = analyzer.analyze_source("add.c", source).unwrap().unwrap();
        assert_eq!(file.functions[0].signature, "add(int, int) -> int");
    }

    #[test]
    fn empty_file_yields_none() {
        let analyzer = TreeSitterAnalyzer::python();
        let result = analyzer.analyze_source("empty.py", "").unwrap();
        assert!(result.is_none());
    }
}
