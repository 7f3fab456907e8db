//! Usage text for degradations
//!
//! The layout is fixed so it can be pasted into documentation:
//!
//! ```text
//!     <name>,<param1>//<param2>: <description>
//!         parameters:
//!             <param1>: <description1>
//!             <param2>: <description2>
//!         example:
//!             <name>,<default1>//<default2>
//! ```

use crate::degradations::degradation::Degradation;
use crate::degradations::registry::{NAME_SEPARATOR, VALUE_SEPARATOR};

const HEADER_INDENT: &str = "    ";
const SECTION_INDENT: &str = "        ";
const ITEM_INDENT: &str = "            ";

/// Generates help text for degradations
pub struct DegradationUsageDocGenerator;

impl DegradationUsageDocGenerator {
    /// Help text for one degradation, without a trailing newline
    pub fn get_degradation_help(degradation: &dyn Degradation) -> String {
        let params = degradation.parameters_info();

        let names: Vec<&str> = params.iter().map(|p| p.name).collect();
        let defaults: Vec<String> = params.iter().map(|p| p.default_display()).collect();

        let mut lines = Vec::with_capacity(params.len() + 4);
        lines.push(format!(
            "{}{}: {}",
            HEADER_INDENT,
            invocation(degradation.name(), &names),
            degradation.description()
        ));

        lines.push(format!("{}parameters:", SECTION_INDENT));
        for param in params {
            lines.push(format!("{}{}: {}", ITEM_INDENT, param.name, param.description));
        }

        lines.push(format!("{}example:", SECTION_INDENT));
        lines.push(format!(
            "{}{}",
            ITEM_INDENT,
            invocation(degradation.name(), &defaults)
        ));

        lines.join("\n")
    }

    /// Help text for several degradations, separated by blank lines
    pub fn get_help(degradations: &[Box<dyn Degradation>]) -> String {
        degradations
            .iter()
            .map(|d| Self::get_degradation_help(d.as_ref()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn invocation<S: AsRef<str>>(name: &str, values: &[S]) -> String {
    if values.is_empty() {
        return name.to_string();
    }

    let joined: Vec<&str> = values.iter().map(|v| v.as_ref()).collect();
    format!("{}{}{}", name, NAME_SEPARATOR, joined.join(VALUE_SEPARATOR))
}
