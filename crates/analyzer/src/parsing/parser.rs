use crate::error::ParseError;
use crate::parsing::declarations;
use crate::parsing::syntax::{Position, SyntaxUnit};
use std::cell::RefCell;
use std::path::Path;
use tree_sitter::{Node, Parser, Tree};

// Parsers are not shareable across threads, so every worker lazily builds its own.
thread_local! {
    static PARSER: RefCell<Option<Parser>> = const { RefCell::new(None) };
}

fn java_parser() -> Result<Parser, ParseError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_java::LANGUAGE.into())
        .map_err(|e| ParseError::Language(e.to_string()))?;
    Ok(parser)
}

fn parse_tree(path: &Path, source: &str) -> Result<Tree, ParseError> {
    PARSER.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            *slot = Some(java_parser()?);
        }
        let Some(parser) = slot.as_mut() else {
            return Err(ParseError::NoTree(path.to_path_buf()));
        };
        parser
            .parse(source, None)
            .ok_or_else(|| ParseError::NoTree(path.to_path_buf()))
    })
}

/// Parse a Java file into a [`SyntaxUnit`].
///
/// With `strict` set, any syntax error in the tree fails the file. Otherwise
/// the tree is kept and error nodes are left for the extraction walk to trip on.
pub fn parse_java(path: &Path, source: String, strict: bool) -> Result<SyntaxUnit, ParseError> {
    let tree = parse_tree(path, &source)?;

    if strict && tree.root_node().has_error() {
        let position = first_error(tree.root_node())
            .map(|node| Position::of(node, &source))
            .unwrap_or_default();
        return Err(ParseError::Syntax {
            path: path.to_path_buf(),
            line: position.line,
            column: position.column,
        });
    }

    let declarations = declarations::collect(tree.root_node(), &source);

    Ok(SyntaxUnit {
        path: path.to_path_buf(),
        package: declarations.package,
        imports: declarations.imports,
        types: declarations.types,
        tree,
        source,
    })
}

fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() {
            let mut cursor = node.walk();
            let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::syntax::{TypeKind, TypeSyntax};

    fn parse(source: &str) -> SyntaxUnit {
        parse_java(Path::new("/src/Test.java"), source.to_string(), true).expect("parses")
    }

    #[test]
    fn test_package_and_imports() {
        let unit = parse(
            "package com.example.app;\n\
             import java.util.List;\n\
             import java.util.*;\n\
             import static java.lang.Math.max;\n\
             class Test {}\n",
        );

        assert_eq!(unit.package, "com.example.app");
        assert_eq!(unit.imports.len(), 3);
        assert_eq!(unit.imports[0].path, "java.util.List");
        assert!(!unit.imports[0].on_demand);
        assert_eq!(unit.imports[1].path, "java.util");
        assert!(unit.imports[1].on_demand);
        assert!(unit.imports[2].is_static);
        assert_eq!(unit.imports[2].simple_name(), "max");
    }

    #[test]
    fn test_nested_and_local_types() {
        let unit = parse(
            "package p;\n\
             public class Outer<T> extends Base implements Runnable {\n\
               static class Inner { int count; }\n\
               enum Mode { ON, OFF }\n\
               void run() { class Local {} }\n\
             }\n\
             class Sibling {}\n",
        );

        let names: Vec<Option<&str>> = unit
            .types
            .iter()
            .map(|t| t.qualified_name.as_deref())
            .collect();
        assert_eq!(
            names,
            vec![
                Some("p.Outer"),
                Some("p.Outer.Inner"),
                Some("p.Outer.Mode"),
                None,
                Some("p.Sibling"),
            ]
        );

        let outer = &unit.types[0];
        assert_eq!(outer.type_parameters[0].name, "T");
        assert_eq!(
            outer.superclass,
            Some(TypeSyntax::Named(vec!["Base".to_string()]))
        );
        assert_eq!(outer.interfaces.len(), 1);
        assert_eq!(outer.members, vec![1, 2]);

        let mode = &unit.types[2];
        assert_eq!(mode.kind, TypeKind::Enum);
        assert!(mode.fields.iter().any(|f| f.name == "ON" && f.is_static));
        assert!(mode.methods.iter().any(|m| m.name == "values" && m.synthetic));

        assert_eq!(unit.find_type(&["Outer", "Inner"]), Some(1));
        assert_eq!(unit.find_type(&["Local"]), None);
        assert_eq!(unit.types[3].parent, Some(0));
    }

    #[test]
    fn test_methods_and_varargs() {
        let unit = parse(
            "class Test {\n\
               Test(int a) {}\n\
               static <E> String join(String sep, E... items) { return null; }\n\
               int[] values(long[][] grid) { return null; }\n\
             }\n",
        );
        let methods = &unit.types[0].methods;

        assert!(methods[0].is_constructor);
        let join = &methods[1];
        assert!(join.varargs);
        assert!(join.is_static);
        assert_eq!(join.type_parameters[0].name, "E");
        assert_eq!(join.parameters[1].ty.to_string(), "E[]");
        assert_eq!(join.name_position, Position::new(3, 19));
        assert_eq!(
            methods[2].return_type.as_ref().map(|t| t.to_string()),
            Some("int[]".to_string())
        );
        assert_eq!(methods[2].parameters[0].ty.to_string(), "long[][]");
    }

    #[test]
    fn test_record_components_become_accessors() {
        let unit = parse("record Point(int x, int y) {}");
        let point = &unit.types[0];

        assert_eq!(point.kind, TypeKind::Record);
        assert_eq!(point.fields.len(), 2);
        assert!(
            point
                .methods
                .iter()
                .any(|m| m.name == "x" && m.parameters.is_empty())
        );
        assert!(
            point
                .methods
                .iter()
                .any(|m| m.is_constructor && m.parameters.len() == 2)
        );
    }

    #[test]
    fn test_strict_parse_rejects_syntax_errors() {
        let err = parse_java(
            Path::new("/src/Broken.java"),
            "class Broken { void f( { }".to_string(),
            true,
        )
        .expect_err("syntax error");
        assert!(matches!(err, ParseError::Syntax { .. }));

        let lenient = parse_java(
            Path::new("/src/Broken.java"),
            "class Broken { void f( { }".to_string(),
            false,
        )
        .expect("lenient parse keeps the tree");
        assert!(lenient.root().has_error());
    }

    #[test]
    fn test_columns_count_characters() {
        let unit = parse("class Ünïcode { Ünïcode other; }");
        let field = &unit.types[0].fields[0];
        assert_eq!(field.position, Position::new(1, 25));
    }
}
