//! Settings handed to the rendering layer when it creates a live grid.

use crate::attrs::{NamedExpression, WidgetAttrs};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier of the external formula engine the grid is built with
pub const FORMULA_ENGINE: &str = "hyperformula";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormulasConfig {
    pub engine: String,
    pub named_expressions: Vec<NamedExpression>,
}

impl FormulasConfig {
    pub fn new(named_expressions: Vec<NamedExpression>) -> Self {
        Self {
            engine: FORMULA_ENGINE.to_string(),
            named_expressions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSettings {
    pub col_headers: bool,
    pub row_headers: bool,
    pub height: Value,
    pub width: Value,
    pub license_key: String,
    #[serde(rename = "stretchH")]
    pub stretch_h: String,
    pub context_menu: bool,
    pub manual_column_resize: bool,
    pub manual_row_resize: bool,
    pub formulas: FormulasConfig,
    /// Unrecognized config keys, forwarded untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WidgetSettings {
    pub fn from_attrs(attrs: &WidgetAttrs) -> Self {
        let config = &attrs.config;
        Self {
            col_headers: config.col_headers,
            row_headers: config.row_headers,
            height: config.height.clone(),
            width: config.width.clone(),
            license_key: config.license_key.clone(),
            stretch_h: "all".to_string(),
            context_menu: true,
            manual_column_resize: true,
            manual_row_resize: true,
            formulas: FormulasConfig::new(attrs.named_expressions.clone()),
            extra: config.extra.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::ExpressionValue;
    use serde_json::json;

    #[test]
    fn test_settings_from_default_attrs() {
        let settings = WidgetSettings::from_attrs(&WidgetAttrs::default());

        assert!(settings.col_headers);
        assert!(settings.row_headers);
        assert_eq!(settings.height, json!("auto"));
        assert_eq!(settings.width, json!("100%"));
        assert_eq!(settings.stretch_h, "all");
        assert_eq!(settings.formulas.engine, FORMULA_ENGINE);
        assert!(settings.formulas.named_expressions.is_empty());
    }

    #[test]
    fn test_settings_carry_named_expressions() {
        let attrs = WidgetAttrs {
            named_expressions: vec![NamedExpression {
                name: "RATE".into(),
                expression: ExpressionValue::Text("=0.2".into()),
            }],
            ..Default::default()
        };

        let value = serde_json::to_value(WidgetSettings::from_attrs(&attrs)).unwrap();
        assert_eq!(
            value["formulas"]["namedExpressions"],
            json!([{ "name": "RATE", "expression": "=0.2" }])
        );
        assert_eq!(value["stretchH"], json!("all"));
    }
}
