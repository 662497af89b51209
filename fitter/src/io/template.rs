//! Batch configuration document rendering.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use minijinja::Environment;
use serde::Serialize;
use tracing::debug;

use crate::core::command::EngineLayout;
use crate::core::request::FitRequest;
use crate::io::config::AnalysisConfig;

const SIMPLE_GLOBAL_FITTER: &str = include_str!("templates/simple_global_fitter.bf");
const TEMPLATE_NAME: &str = "simple_global_fitter.bf";

/// Values substituted into the option slots, in slot order.
///
/// Everything is embedded verbatim; quoting inside a value is not escaped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigSlots {
    pub analysis_module: String,
    pub writer_module: String,
    pub tree: String,
    pub input: String,
    pub output: String,
    pub genetic_code: String,
    pub model: String,
    pub data_reader: String,
}

impl ConfigSlots {
    pub fn new(request: &FitRequest, layout: &EngineLayout, analysis: &AnalysisConfig) -> Result<Self> {
        Ok(Self {
            analysis_module: analysis.module.clone(),
            writer_module: analysis.writer.clone(),
            tree: analysis.tree.clone(),
            input: utf8(&request.input, "input path")?,
            output: utf8(&request.output, "output path")?,
            genetic_code: request.genetic_code.clone(),
            model: request.model.clone(),
            data_reader: utf8(&layout.data_reader, "data reader path")?,
        })
    }
}

fn utf8(path: &Path, label: &str) -> Result<String> {
    path.to_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("{label} is not valid UTF-8: {}", path.display()))
}

/// Template engine wrapper around minijinja.
pub struct ConfigTemplate {
    env: Environment<'static>,
}

impl ConfigTemplate {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        // Keep the document byte-for-byte as written, including the final newline.
        env.set_keep_trailing_newline(true);
        env.add_template(TEMPLATE_NAME, SIMPLE_GLOBAL_FITTER)
            .context("load simple global fitter template")?;
        Ok(Self { env })
    }

    pub fn render(&self, slots: &ConfigSlots) -> Result<String> {
        let template = self.env.get_template(TEMPLATE_NAME)?;
        let rendered = template
            .render(slots)
            .context("render simple global fitter template")?;
        debug!(bytes = rendered.len(), "rendered batch config");
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{execute_target, option_slot, sample_slots};

    #[test]
    fn input_slots_are_embedded_verbatim_in_order() {
        let doc = ConfigTemplate::new()
            .expect("template")
            .render(&sample_slots())
            .expect("render");

        assert_eq!(option_slot(&doc, "03").as_deref(), Some("/data/input.fasta"));
        assert_eq!(option_slot(&doc, "04").as_deref(), Some("/data/out.csv"));
        assert_eq!(option_slot(&doc, "05").as_deref(), Some("Universal"));
        assert_eq!(option_slot(&doc, "06").as_deref(), Some("HKY85"));
    }

    #[test]
    fn fixed_slots_and_reader_directive() {
        let doc = ConfigTemplate::new()
            .expect("template")
            .render(&sample_slots())
            .expect("render");

        assert_eq!(
            option_slot(&doc, "00").as_deref(),
            Some("../AnalysisModules/SimpleGlobalFitter.bf")
        );
        assert_eq!(option_slot(&doc, "01").as_deref(), Some("../Writers/TAB.bf"));
        assert_eq!(option_slot(&doc, "02").as_deref(), Some(""));
        assert_eq!(
            execute_target(&doc).as_deref(),
            Some("/opt/tools/hyphy/GenomeFitters/DataReaders/FastaReader.bf")
        );
        assert!(doc.starts_with("_genomeScreenOptions = {};\n"));
        assert!(doc.ends_with("_genomeScreenOptions);\n"));
    }

    #[test]
    fn markup_like_values_are_not_escaped() {
        let slots = ConfigSlots {
            model: "<0,1>&\"x\"".to_string(),
            tree: "(human, chimp, mouse)".to_string(),
            ..sample_slots()
        };
        let doc = ConfigTemplate::new()
            .expect("template")
            .render(&slots)
            .expect("render");
        assert!(doc.contains(r#"_genomeScreenOptions ["06"] = "<0,1>&"x"";"#));
        assert_eq!(option_slot(&doc, "02").as_deref(), Some("(human, chimp, mouse)"));
    }

    #[test]
    fn slots_come_from_request_layout_and_analysis() {
        let request = FitRequest::resolve_in(
            Path::new("/data"),
            "input.fasta",
            "out.csv",
            "Universal",
            "HKY85",
            "/opt/tools/hyphy",
        );
        let layout = EngineLayout::new(
            &request.engine_base,
            "HYPHY",
            "GenomeFitters/DataReaders/FastaReader.bf",
        );
        let slots =
            ConfigSlots::new(&request, &layout, &AnalysisConfig::default()).expect("slots");
        assert_eq!(slots, sample_slots());
    }
}
