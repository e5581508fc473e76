use crate::error::ReportError;
use crate::project::layout::OutputLayout;
use crate::report::{Category, FactRow, ReportKind, ReportSink, ReportWriter};
use arrow::{
    array::{ArrayRef, StringArray, UInt32Array},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use parquet::{arrow::ArrowWriter, basic::Compression, file::properties::WriterProperties};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Writes each table of a report to its own Parquet file next to the mirrored
/// source path: `<output>/<relative>.<kind>[.packages|.errors].parquet`.
#[derive(Debug, Clone)]
pub struct ParquetReportSink {
    layout: OutputLayout,
}

impl ParquetReportSink {
    pub fn new(layout: OutputLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }
}

impl ReportSink for ParquetReportSink {
    fn open(&self, source: &Path, kind: ReportKind) -> Result<Box<dyn ReportWriter>, ReportError> {
        let stem = self.layout.output_stem(source)?;
        if let Some(parent) = stem.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ReportError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        Ok(Box::new(ParquetReportWriter {
            stem,
            kind,
            regular: Vec::new(),
            packages: Vec::new(),
            errors: Vec::new(),
        }))
    }
}

pub fn table_path(stem: &Path, kind: ReportKind, category: Category) -> PathBuf {
    let mut name = stem.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(kind.as_str());
    if let Some(suffix) = category.suffix() {
        name.push(".");
        name.push(suffix);
    }
    name.push(".parquet");
    stem.with_file_name(name)
}

struct ParquetReportWriter {
    stem: PathBuf,
    kind: ReportKind,
    regular: Vec<FactRow>,
    packages: Vec<FactRow>,
    errors: Vec<FactRow>,
}

impl ReportWriter for ParquetReportWriter {
    fn append(&mut self, row: FactRow) -> Result<(), ReportError> {
        match row.category() {
            Category::Regular => self.regular.push(row),
            Category::Packages => self.packages.push(row),
            Category::Errors => self.errors.push(row),
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), ReportError> {
        for category in Category::ALL {
            let rows = match category {
                Category::Regular => std::mem::take(&mut self.regular),
                Category::Packages => std::mem::take(&mut self.packages),
                Category::Errors => std::mem::take(&mut self.errors),
            };
            let path = table_path(&self.stem, self.kind, category);

            if rows.is_empty() {
                // Leftovers of an earlier run would no longer match the source
                match std::fs::remove_file(&path) {
                    Ok(()) => debug!("Removed stale report {}", path.display()),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(source) => return Err(ReportError::Io { path, source }),
                }
                continue;
            }

            let batch = record_batch(self.kind, category, &rows)?;
            write_batch(&path, batch)?;
        }
        Ok(())
    }
}

fn record_batch(
    kind: ReportKind,
    category: Category,
    rows: &[FactRow],
) -> Result<RecordBatch, ReportError> {
    let lines = UInt32Array::from(rows.iter().map(|r| r.position().line).collect::<Vec<_>>());
    let columns = UInt32Array::from(rows.iter().map(|r| r.position().column).collect::<Vec<_>>());

    let (fields, arrays): (Vec<Field>, Vec<ArrayRef>) = match (kind, category) {
        (ReportKind::Lines, Category::Regular) => {
            let mut owners = Vec::with_capacity(rows.len());
            let mut methods = Vec::with_capacity(rows.len());
            let mut argument_types = Vec::with_capacity(rows.len());
            let mut ref_lines = Vec::with_capacity(rows.len());
            let mut ref_columns = Vec::with_capacity(rows.len());
            for row in rows {
                if let FactRow::Call {
                    owner,
                    method,
                    argument_types: arguments,
                    reference,
                    ..
                } = row
                {
                    owners.push(owner.as_str());
                    methods.push(method.as_deref());
                    argument_types.push(arguments.as_deref());
                    ref_lines.push(reference.map(|p| p.line));
                    ref_columns.push(reference.map(|p| p.column));
                }
            }
            (
                vec![
                    Field::new("owner", DataType::Utf8, false),
                    Field::new("method", DataType::Utf8, true),
                    Field::new("argTypes", DataType::Utf8, true),
                    Field::new("refLine", DataType::UInt32, true),
                    Field::new("refCol", DataType::UInt32, true),
                ],
                vec![
                    Arc::new(StringArray::from(owners)) as ArrayRef,
                    Arc::new(StringArray::from(methods)),
                    Arc::new(StringArray::from(argument_types)),
                    Arc::new(UInt32Array::from(ref_lines)),
                    Arc::new(UInt32Array::from(ref_columns)),
                ],
            )
        }
        (_, Category::Regular) => {
            let types: Vec<&str> = rows
                .iter()
                .filter_map(|row| match row {
                    FactRow::Type { type_name, .. } => Some(type_name.as_str()),
                    _ => None,
                })
                .collect();
            (
                vec![Field::new("type", DataType::Utf8, false)],
                vec![Arc::new(StringArray::from(types)) as ArrayRef],
            )
        }
        (_, Category::Packages) => {
            let (packages, types): (Vec<&str>, Vec<&str>) = rows
                .iter()
                .filter_map(|row| match row {
                    FactRow::Package {
                        package, type_name, ..
                    } => Some((package.as_str(), type_name.as_str())),
                    _ => None,
                })
                .unzip();
            (
                vec![
                    Field::new("package", DataType::Utf8, false),
                    Field::new("type", DataType::Utf8, false),
                ],
                vec![
                    Arc::new(StringArray::from(packages)) as ArrayRef,
                    Arc::new(StringArray::from(types)),
                ],
            )
        }
        (_, Category::Errors) => {
            let (nodes, errors): (Vec<&str>, Vec<&str>) = rows
                .iter()
                .filter_map(|row| match row {
                    FactRow::Error { node, error, .. } => Some((node.as_str(), error.as_str())),
                    _ => None,
                })
                .unzip();
            (
                vec![
                    Field::new("node", DataType::Utf8, false),
                    Field::new("error", DataType::Utf8, false),
                ],
                vec![
                    Arc::new(StringArray::from(nodes)) as ArrayRef,
                    Arc::new(StringArray::from(errors)),
                ],
            )
        }
    };

    let mut schema_fields = vec![
        Field::new("line", DataType::UInt32, false),
        Field::new("col", DataType::UInt32, false),
    ];
    schema_fields.extend(fields);
    let mut columns_out: Vec<ArrayRef> = vec![Arc::new(lines), Arc::new(columns)];
    columns_out.extend(arrays);

    let schema = Arc::new(Schema::new(schema_fields));
    Ok(RecordBatch::try_new(schema, columns_out)?)
}

fn write_batch(path: &Path, batch: RecordBatch) -> Result<(), ReportError> {
    let file = File::create(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    debug!("Wrote {} rows to {}", batch.num_rows(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::syntax::Position;
    use crate::report::FileReport;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use tempfile::TempDir;

    fn read_table(path: &Path) -> RecordBatch {
        let file = File::open(path).unwrap();
        let mut reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .unwrap()
            .build()
            .unwrap();
        reader.next().unwrap().unwrap()
    }

    #[test]
    fn test_table_path_naming() {
        let stem = Path::new("/out/pkg/Foo.java");
        assert_eq!(
            table_path(stem, ReportKind::Lines, Category::Regular),
            PathBuf::from("/out/pkg/Foo.java.lines.parquet")
        );
        assert_eq!(
            table_path(stem, ReportKind::Definitions, Category::Errors),
            PathBuf::from("/out/pkg/Foo.java.def.errors.parquet")
        );
    }

    #[test]
    fn test_writes_only_non_empty_tables() {
        let source_dir = TempDir::new().unwrap();
        let output_dir = TempDir::new().unwrap();
        let source = source_dir.path().canonicalize().unwrap().join("pkg/Bar.java");

        let sink = ParquetReportSink::new(OutputLayout::single_output(
            [source_dir.path().to_path_buf()],
            output_dir.path(),
        ));
        let mut report = FileReport::open(&sink, &source, ReportKind::Lines).unwrap();
        report
            .append(FactRow::Call {
                position: Position::new(4, 9),
                owner: "pkg.Foo".to_string(),
                method: Some("doThing".to_string()),
                argument_types: Some("int".to_string()),
                reference: Some(Position::new(3, 17)),
            })
            .unwrap();
        report
            .append(FactRow::Call {
                position: Position::new(4, 5),
                owner: "pkg.Foo".to_string(),
                method: None,
                argument_types: None,
                reference: None,
            })
            .unwrap();
        report.close().unwrap();

        let stem = output_dir.path().join("pkg/Bar.java");
        let batch = read_table(&table_path(&stem, ReportKind::Lines, Category::Regular));
        assert_eq!(batch.num_rows(), 2);
        let names: Vec<String> = batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        assert_eq!(
            names,
            ["line", "col", "owner", "method", "argTypes", "refLine", "refCol"]
        );
        assert!(!table_path(&stem, ReportKind::Lines, Category::Errors).exists());
        assert!(!table_path(&stem, ReportKind::Lines, Category::Packages).exists());
    }

    #[test]
    fn test_source_outside_layout_is_an_error() {
        let output_dir = TempDir::new().unwrap();
        let sink = ParquetReportSink::new(OutputLayout::new([(
            PathBuf::from("/nonexistent/root"),
            output_dir.path().to_path_buf(),
        )]));

        let result = sink.open(Path::new("/elsewhere/Foo.java"), ReportKind::Types);
        assert!(matches!(result, Err(ReportError::OutputLayout { matches: 0, .. })));
    }
}
