//! Rule implementations, one per file.
//!
//! - [`StandaloneDocumentRule`](crate::StandaloneDocumentRule)s only need the
//!   document and the fragments visible from it
//! - [`DocumentSchemaRule`](crate::DocumentSchemaRule)s also need the schema

mod fields_on_correct_type;
mod known_directives;
mod known_fragment_names;
mod known_type_names;
mod lone_anonymous_operation;
mod no_undefined_variables;
mod scalar_leafs;
mod unique_names;

pub use fields_on_correct_type::FieldsOnCorrectTypeRule;
pub use known_directives::KnownDirectivesRule;
pub use known_fragment_names::KnownFragmentNamesRule;
pub use known_type_names::KnownTypeNamesRule;
pub use lone_anonymous_operation::LoneAnonymousOperationRule;
pub use no_undefined_variables::NoUndefinedVariablesRule;
pub use scalar_leafs::ScalarLeafsRule;
pub use unique_names::{UniqueFragmentNamesRule, UniqueOperationNamesRule};

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{
        DocumentSchemaRule, FragmentIndex, RuleContext, RuleDiagnostic, StandaloneDocumentRule,
    };
    use apollo_compiler::parser::Parser;
    use apollo_compiler::{ast, Schema};
    use graphql_extract::OffsetMap;
    use graphql_syntax::EmbeddedDocument;
    use graphql_types::OffsetRange;
    use std::sync::Arc;

    pub fn document(text: &str) -> EmbeddedDocument {
        let ast = Parser::new().parse_ast(text, "test.graphql").unwrap();
        EmbeddedDocument {
            index: 0,
            source: Arc::from(text),
            ast: Some(Arc::new(ast)),
            range: OffsetRange::new(0, text.len()),
            offset_map: OffsetMap::identity(0, text.len()),
            interpolations: Vec::new(),
        }
    }

    /// Index holding the document's own fragments as local ones.
    pub fn local_fragments(document: &EmbeddedDocument) -> FragmentIndex {
        let mut index = FragmentIndex::new();
        for definition in &document.ast.as_ref().unwrap().definitions {
            if let ast::Definition::FragmentDefinition(fragment) = definition {
                index.add_local(document.index, fragment.clone());
            }
        }
        index
    }

    pub fn schema(sdl: &str) -> Schema {
        Schema::parse_and_validate(sdl, "schema.graphql")
            .unwrap()
            .into_inner()
    }

    pub fn check_standalone(rule: &dyn StandaloneDocumentRule, text: &str) -> Vec<RuleDiagnostic> {
        let document = document(text);
        let fragments = local_fragments(&document);
        let cx = RuleContext {
            document: &document,
            ast: document.ast.as_deref().unwrap(),
            fragments: &fragments,
        };
        rule.check(&cx)
    }

    pub fn check_with_schema(
        rule: &dyn DocumentSchemaRule,
        sdl: &str,
        text: &str,
    ) -> Vec<RuleDiagnostic> {
        let schema = schema(sdl);
        let document = document(text);
        let fragments = local_fragments(&document);
        let cx = RuleContext {
            document: &document,
            ast: document.ast.as_deref().unwrap(),
            fragments: &fragments,
        };
        rule.check(&cx, &schema)
    }

    pub fn messages(diagnostics: &[RuleDiagnostic]) -> Vec<&str> {
        diagnostics.iter().map(|d| d.message.as_str()).collect()
    }
}
