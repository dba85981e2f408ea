use crate::contracts::types::ImportIssue;
use crate::{ClientError, ClientResult};

const DATE_HEADERS: [&str; 5] = [
    "date",
    "transaction date",
    "posted date",
    "posting date",
    "trans. date",
];
const DESCRIPTION_HEADERS: [&str; 4] = ["description", "payee", "merchant", "name"];
const ORIGINAL_DESCRIPTION_HEADERS: [&str; 2] = ["original description", "memo"];
const CATEGORY_HEADERS: [&str; 1] = ["category"];
const AMOUNT_HEADERS: [&str; 2] = ["amount", "transaction amount"];
const DEBIT_HEADERS: [&str; 1] = ["debit"];
const CREDIT_HEADERS: [&str; 1] = ["credit"];
const STATUS_HEADERS: [&str; 1] = ["status"];

#[derive(Debug, Clone, Copy)]
enum AmountColumns {
    Signed(usize),
    DebitCredit { debit: usize, credit: usize },
}

#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    date: usize,
    description: usize,
    amount: AmountColumns,
    original_description: Option<usize>,
    category: Option<usize>,
    status: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RawAmount {
    Signed(Option<String>),
    DebitCredit {
        debit: Option<String>,
        credit: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct ParsedRow {
    pub(crate) row: i64,
    pub(crate) posted_at: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) amount: RawAmount,
    pub(crate) original_description: Option<String>,
    pub(crate) category: Option<String>,
    pub(crate) status: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct ParsedFile {
    pub(crate) rows: Vec<ParsedRow>,
    /// Records the CSV reader itself could not decode.
    pub(crate) issues: Vec<ImportIssue>,
}

impl ParsedFile {
    pub(crate) fn rows_read(&self) -> i64 {
        (self.rows.len() + self.issues.len()) as i64
    }
}

pub(crate) fn parse_csv(source_ref: &str, content: &str) -> ClientResult<ParsedFile> {
    let body = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|error| {
            ClientError::import_schema_mismatch(
                source_ref,
                vec![format!("readable header row ({error})")],
                Vec::new(),
            )
        })?
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<String>>();

    let columns = map_columns(source_ref, &headers)?;

    let mut rows = Vec::new();
    let mut issues = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let row = (index as i64) + 1;
        let record = match record {
            Ok(record) => record,
            Err(error) => {
                log::warn!("skipping unreadable row {row} in {source_ref}: {error}");
                issues.push(ImportIssue {
                    row,
                    field: "record".to_string(),
                    code: "malformed_row".to_string(),
                    description: format!("row could not be read as CSV: {error}"),
                    expected: None,
                    received: None,
                });
                continue;
            }
        };

        if record.iter().all(|value| value.is_empty()) {
            continue;
        }

        let amount = match columns.amount {
            AmountColumns::Signed(index) => RawAmount::Signed(cell(&record, Some(index))),
            AmountColumns::DebitCredit { debit, credit } => RawAmount::DebitCredit {
                debit: cell(&record, Some(debit)),
                credit: cell(&record, Some(credit)),
            },
        };

        rows.push(ParsedRow {
            row,
            posted_at: cell(&record, Some(columns.date)),
            description: cell(&record, Some(columns.description)),
            amount,
            original_description: cell(&record, columns.original_description),
            category: cell(&record, columns.category),
            status: cell(&record, columns.status),
        });
    }

    Ok(ParsedFile { rows, issues })
}

fn map_columns(source_ref: &str, headers: &[String]) -> ClientResult<ColumnMap> {
    let normalized = headers
        .iter()
        .map(|header| header.trim().to_lowercase())
        .collect::<Vec<String>>();
    let find = |aliases: &[&str]| {
        aliases
            .iter()
            .find_map(|alias| normalized.iter().position(|header| header == alias))
    };

    let date = find(&DATE_HEADERS);
    let description = find(&DESCRIPTION_HEADERS);
    let amount = match find(&AMOUNT_HEADERS) {
        Some(index) => Some(AmountColumns::Signed(index)),
        None => match (find(&DEBIT_HEADERS), find(&CREDIT_HEADERS)) {
            (Some(debit), Some(credit)) => Some(AmountColumns::DebitCredit { debit, credit }),
            _ => None,
        },
    };

    let (Some(date), Some(description), Some(amount)) = (date, description, amount) else {
        let mut missing = Vec::new();
        if date.is_none() {
            missing.push("date".to_string());
        }
        if description.is_none() {
            missing.push("description".to_string());
        }
        if amount.is_none() {
            missing.push("amount".to_string());
        }
        return Err(ClientError::import_schema_mismatch(
            source_ref,
            missing,
            headers.to_vec(),
        ));
    };

    Ok(ColumnMap {
        date,
        description,
        amount,
        original_description: find(&ORIGINAL_DESCRIPTION_HEADERS),
        category: find(&CATEGORY_HEADERS),
        status: find(&STATUS_HEADERS),
    })
}

fn cell(record: &csv::StringRecord, index: Option<usize>) -> Option<String> {
    let value = record.get(index?)?;
    if value.is_empty() {
        return None;
    }
    Some(value.to_string())
}
