// crates/esctl-cli/src/services/output.rs - Output Rendering Service
//
// Turns the core's Table and Entity views into text on stdout. Commands
// never format output themselves: they project a response, optionally
// highlight a few cells with a tone, and hand the result over.
//
// FORMATS:
// - table: bordered terminal table; entities become a Field/Value table
// - json:  array of label-keyed objects; entities become one object
// - csv:   header row then rows; entities become Field,Value rows
// - yaml:  same shapes as json
// - value: values only, space-separated, one row per line
//
// ORDER OF OPERATIONS:
// --sort-column, then --column, then formatting. Highlight tones are painted
// last, so sorting only ever sees raw values.
//
// Colour is only ever produced for the table format on a terminal, so the
// painter handed out for every other format is `Plain`.

use anyhow::{Context as AnyhowContext, Result};
use comfy_table::{ContentArrangement, Table as TextTable, presets::UTF8_FULL};
use console::{Term, style};
use esctl_core::projection::{Entity, Projector, Table, display_value};
use esctl_core::style::{Painter, Plain, Tone};
use serde_json::Value;

use crate::cli::{OutputArgs, OutputFormat};

/// Painter emitting ANSI escape codes
#[derive(Debug, Clone, Copy, Default)]
pub struct AnsiPainter;

impl Painter for AnsiPainter {
    fn paint(&self, text: &str, tone: Tone) -> String {
        let styled = style(text).force_styling(true);
        let styled = match tone {
            Tone::Green => styled.green(),
            Tone::Yellow => styled.yellow(),
            Tone::Red => styled.red(),
            Tone::Cyan => styled.cyan(),
            Tone::Blue => styled.blue(),
            Tone::Purple => styled.magenta(),
            Tone::Bold => styled.bold(),
            Tone::Italic => styled.italic(),
            Tone::Underline => styled.underlined(),
        };
        styled.to_string()
    }
}

/// Renders projected views according to the output flags
pub struct OutputService {
    options: OutputArgs,
    color: bool,
}

impl OutputService {
    /// Colour is enabled for table output on a terminal unless --no-color
    pub fn new(options: OutputArgs) -> Self {
        let color = options.format == OutputFormat::Table
            && !options.no_color
            && Term::stdout().is_term()
            && console::colors_enabled();
        Self::with_color(options, color)
    }

    pub fn with_color(options: OutputArgs, color: bool) -> Self {
        Self { options, color }
    }

    pub fn format(&self) -> OutputFormat {
        self.options.format
    }

    /// Projector honouring --raw-names
    pub fn projector(&self) -> Projector {
        Projector::new().pretty(!self.options.raw_names)
    }

    pub fn painter(&self) -> &'static dyn Painter {
        if self.color { &AnsiPainter } else { &Plain }
    }

    pub fn print_table(&self, table: Table) -> Result<()> {
        println!("{}", self.render_table(table)?);
        Ok(())
    }

    pub fn print_entity(&self, entity: Entity) -> Result<()> {
        println!("{}", self.render_entity(entity)?);
        Ok(())
    }

    /// Free-form text, e.g. confirmation of a mutation
    pub fn print_message(&self, message: &str) {
        println!("{message}");
    }

    /// A response printed as-is, pretty-printed when it is JSON
    pub fn print_json(&self, value: &Value) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Apply --sort-column and --column, then format
    pub fn render_table(&self, mut table: Table) -> Result<String> {
        if !self.options.sort_columns.is_empty() {
            table
                .sort_by(&self.options.sort_columns)
                .context("Invalid --sort-column")?;
        }
        if !self.options.columns.is_empty() {
            table = table.select(&self.options.columns).context("Invalid --column")?;
        }

        let rendered = match self.options.format {
            OutputFormat::Table => {
                let rows = table.rows().iter().zip(table.tones()).map(|(row, tones)| {
                    row.iter()
                        .zip(tones)
                        .map(|(value, tone)| self.cell(value, *tone))
                        .collect()
                });
                text_table(table.headers().to_vec(), rows)
            }
            OutputFormat::Json => serde_json::to_string_pretty(&table.to_records())?,
            OutputFormat::Yaml => serde_yaml::to_string(&table.to_records())?,
            OutputFormat::Csv => {
                let rows = table
                    .rows()
                    .iter()
                    .map(|row| row.iter().map(display_value).collect());
                csv_text(table.headers(), rows)?
            }
            OutputFormat::Value => table
                .rows()
                .iter()
                .map(|row| row.iter().map(display_value).collect::<Vec<_>>().join(" "))
                .collect::<Vec<_>>()
                .join("\n"),
        };

        Ok(rendered.trim_end().to_string())
    }

    /// Apply --column, then format
    pub fn render_entity(&self, mut entity: Entity) -> Result<String> {
        if !self.options.columns.is_empty() {
            entity = entity.select(&self.options.columns).context("Invalid --column")?;
        }

        let pairs = || {
            entity
                .iter()
                .map(|(key, value)| vec![key.clone(), display_value(value)])
        };

        let rendered = match self.options.format {
            OutputFormat::Table => {
                let rows = entity
                    .iter()
                    .zip(entity.tones())
                    .map(|((key, value), tone)| vec![key.clone(), self.cell(value, *tone)]);
                text_table(vec!["Field".into(), "Value".into()], rows)
            }
            OutputFormat::Json => serde_json::to_string_pretty(&entity.to_record())?,
            OutputFormat::Yaml => serde_yaml::to_string(&entity.to_record())?,
            OutputFormat::Csv => csv_text(&["Field".to_string(), "Value".to_string()], pairs())?,
            OutputFormat::Value => entity
                .values()
                .iter()
                .map(display_value)
                .collect::<Vec<_>>()
                .join("\n"),
        };

        Ok(rendered.trim_end().to_string())
    }

    /// Text of a table cell, painted when it carries a tone
    fn cell(&self, value: &Value, tone: Option<Tone>) -> String {
        match tone {
            Some(tone) if !value.is_null() => self.painter().paint(&display_value(value), tone),
            _ => display_value(value),
        }
    }
}

fn text_table(headers: Vec<String>, rows: impl Iterator<Item = Vec<String>>) -> String {
    let mut table = TextTable::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers);
    for row in rows {
        table.add_row(row);
    }
    table.to_string()
}

fn csv_text(headers: &[String], rows: impl Iterator<Item = Vec<String>>) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    let bytes = writer.into_inner().context("Cannot flush CSV output")?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use esctl_core::projection::{ColumnSpec, columns};
    use serde_json::json;

    fn service(format: OutputFormat) -> OutputService {
        OutputService::with_color(
            OutputArgs {
                format,
                ..OutputArgs::default()
            },
            false,
        )
    }

    fn nodes() -> Table {
        let documents = vec![
            json!({"name": "es02", "ip": "10.0.0.2", "cpu": "12"}),
            json!({"name": "es01", "ip": "10.0.0.1", "cpu": null}),
        ];
        let columns = vec![
            ColumnSpec::new("name"),
            ColumnSpec::new("cpu"),
            ColumnSpec::labeled("ip", "IP"),
        ];
        Projector::new().project(&documents, &columns).unwrap()
    }

    fn health() -> Entity {
        Projector::new()
            .project_one(&json!({"status": "green", "number_of_nodes": 3}), &columns(["status", "number_of_nodes"]))
            .unwrap()
    }

    #[test]
    fn test_csv_table() {
        let out = service(OutputFormat::Csv).render_table(nodes()).unwrap();
        assert_eq!(out, "Name,Cpu,IP\nes02,12,10.0.0.2\nes01,,10.0.0.1");
    }

    #[test]
    fn test_json_table_keeps_nulls() {
        let out = service(OutputFormat::Json).render_table(nodes()).unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["Name"], "es02");
        assert_eq!(parsed[1]["Cpu"], Value::Null);
    }

    #[test]
    fn test_value_table() {
        let out = service(OutputFormat::Value).render_table(nodes()).unwrap();
        assert_eq!(out, "es02 12 10.0.0.2\nes01  10.0.0.1");
    }

    #[test]
    fn test_text_table_contains_cells() {
        let out = service(OutputFormat::Table).render_table(nodes()).unwrap();
        assert!(out.contains("Name"));
        assert!(out.contains("10.0.0.1"));
    }

    #[test]
    fn test_column_selection_and_sorting() {
        let output = OutputService::with_color(
            OutputArgs {
                format: OutputFormat::Csv,
                columns: vec!["IP".into(), "Name".into()],
                sort_columns: vec!["Name".into()],
                ..OutputArgs::default()
            },
            false,
        );
        let out = output.render_table(nodes()).unwrap();
        assert_eq!(out, "IP,Name\n10.0.0.1,es01\n10.0.0.2,es02");

        let output = OutputService::with_color(
            OutputArgs {
                columns: vec!["Nope".into()],
                ..OutputArgs::default()
            },
            false,
        );
        assert!(output.render_table(nodes()).is_err());
    }

    #[test]
    fn test_entity_formats() {
        let out = service(OutputFormat::Csv).render_entity(health()).unwrap();
        assert_eq!(out, "Field,Value\nStatus,green\nNumber Of Nodes,3");

        let out = service(OutputFormat::Json).render_entity(health()).unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, json!({"Status": "green", "Number Of Nodes": 3}));

        let out = service(OutputFormat::Value).render_entity(health()).unwrap();
        assert_eq!(out, "green\n3");
    }

    #[test]
    fn test_raw_names() {
        let output = OutputService::with_color(
            OutputArgs {
                raw_names: true,
                ..OutputArgs::default()
            },
            false,
        );
        assert!(!output.projector().is_pretty());
    }

    #[test]
    fn test_colour_only_for_tables() {
        let output = OutputService::new(OutputArgs {
            format: OutputFormat::Json,
            ..OutputArgs::default()
        });
        assert_eq!(output.painter().paint("x", Tone::Red), "x");

        let output = OutputService::new(OutputArgs {
            no_color: true,
            ..OutputArgs::default()
        });
        assert_eq!(output.painter().paint("x", Tone::Red), "x");

        assert!(service(OutputFormat::Table).painter().paint("x", Tone::Red) == "x");
        assert!(AnsiPainter.paint("x", Tone::Red).contains("\u{1b}["));
    }

    fn allocation() -> Table {
        let documents = vec![
            json!({"node": "a", "disk.percent": "91"}),
            json!({"node": "b", "disk.percent": "9"}),
            json!({"node": "c", "disk.percent": "75"}),
        ];
        let mut table = Projector::new()
            .project(&documents, &columns(["node", "disk.percent"]))
            .unwrap();
        table.highlight(&documents, |node| match node["disk.percent"].as_str() {
            Some("91") => vec![("disk.percent", Tone::Red)],
            Some("75") => vec![("disk.percent", Tone::Yellow)],
            _ => Vec::new(),
        });
        table
    }

    #[test]
    fn test_sorting_a_coloured_column() {
        let output = OutputService::with_color(
            OutputArgs {
                format: OutputFormat::Value,
                columns: vec!["Node".into()],
                sort_columns: vec!["Disk %".into()],
                ..OutputArgs::default()
            },
            true,
        );
        assert_eq!(output.render_table(allocation()).unwrap(), "b\nc\na");

        let output = OutputService::with_color(
            OutputArgs {
                sort_columns: vec!["Disk %".into()],
                ..OutputArgs::default()
            },
            true,
        );
        let out = output.render_table(allocation()).unwrap();
        let (b, c, a) = (out.find("│ b").unwrap(), out.find("│ c").unwrap(), out.find("│ a").unwrap());
        assert!(b < c && c < a);
        assert!(out.contains(&AnsiPainter.paint("91", Tone::Red)));
        assert!(out.contains(&AnsiPainter.paint("75", Tone::Yellow)));
    }

    #[test]
    fn test_tones_are_not_painted_outside_tables() {
        let output = OutputService::with_color(
            OutputArgs {
                format: OutputFormat::Csv,
                ..OutputArgs::default()
            },
            true,
        );
        let out = output.render_table(allocation()).unwrap();
        assert_eq!(out, "Node,Disk %\na,91\nb,9\nc,75");
    }
}
