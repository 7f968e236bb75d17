use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use tuition_ledger::io::excel_write;
use tuition_ledger::model::values::{format_brl, format_date};
use tuition_ledger::model::{
    DueDay, MonthKey, PaymentStatus, PendingDocument, Student, StudentFields,
};
use tuition_ledger::{MatchMode, ReconciliationStore, Result, Session, Settings, TuitionError};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging() {
        eprintln!("warning: {error}");
    }
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| TuitionError::Logging(error.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    let mut settings = match &cli.config {
        Some(path) => Settings::from_json_file(path)?,
        None => Settings::default(),
    };
    if let Some(mode) = cli.match_mode {
        settings.match_mode = mode.into();
    }

    let session = Session::new(&cli.workbook, settings);
    let mut store = session.store();
    if let Some(notice) = session.load_notice() {
        eprintln!("warning: {notice}");
    }

    let output = Output { json: cli.json };
    match cli.command {
        Command::Students { filter } => {
            let students = store.list_students(filter.as_deref());
            output.students(&students)
        }
        Command::Show { name } => {
            let student = store.student(&name)?;
            let history = store.student_history(&name)?;
            output.history(student, &history)
        }
        Command::Enroll(args) => {
            let target = session.save_target(args.save.output.as_deref())?;
            let student = store.add_student(args.fields.into_fields(Some(args.name)))?;
            output.message(&format!("{} enrolled", student.name))?;
            save(&store, target)
        }
        Command::Edit(args) => {
            let target = session.save_target(args.save.output.as_deref())?;
            let student = store.update_student(&args.name, args.fields.into_fields(args.rename))?;
            output.message(&format!("{} updated", student.name))?;
            save(&store, target)
        }
        Command::Status { name, month } => {
            let status = store.month_status(&name, &month)?;
            output.status(&name, &month, &status)
        }
        Command::Pay(args) => {
            let target = session.save_target(args.save.output.as_deref())?;
            let date = args.date.unwrap_or_else(today);
            let entry =
                store.record_payment(&args.name, &args.month, args.amount, &date, &args.method)?;
            output.message(&format!(
                "{} recorded in {} ({})",
                entry.description,
                args.month,
                format_brl(entry.amount)
            ))?;
            save(&store, target)
        }
        Command::Undo(args) => {
            let target = session.save_target(args.save.output.as_deref())?;
            let removed = store.undo_payment(&args.name, &args.month)?;
            output.message(&format!("removed '{}' from {}", removed.description, args.month))?;
            save(&store, target)
        }
        Command::Expense(args) => {
            let target = session.save_target(args.save.output.as_deref())?;
            let date = args.date.unwrap_or_else(today);
            let entry = store.record_expense(&args.month, &args.description, args.amount, &date)?;
            output.message(&format!(
                "{} recorded in {} ({})",
                entry.description,
                args.month,
                format_brl(entry.amount)
            ))?;
            save(&store, target)
        }
        Command::Pending { month } => {
            let students = store.pending_students(&month)?;
            output.students(&students)
        }
        Command::Totals { month } => {
            let totals = store.month_totals(&month)?;
            if output.json {
                return output.print_json(&totals);
            }
            println!("entradas: {}", format_brl(totals.income));
            println!("saídas:   {}", format_brl(totals.expense));
            println!("saldo:    {}", format_brl(totals.balance));
            Ok(())
        }
        Command::Export { output: path } => {
            let target = session.save_target(Some(path.as_path()))?;
            store.refresh_last_payments();
            save(&store, target)
        }
    }
}

fn save(store: &ReconciliationStore, path: &Path) -> Result<()> {
    excel_write::export_to_path(store, path)?;
    eprintln!("saved {}", path.display());
    Ok(())
}

fn today() -> String {
    format_date(Local::now().date_naive())
}

struct Output {
    json: bool,
}

impl Output {
    fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    fn message(&self, text: &str) -> Result<()> {
        if self.json {
            return self.print_json(&serde_json::json!({ "message": text }));
        }
        println!("{text}");
        Ok(())
    }

    fn students(&self, students: &[&Student]) -> Result<()> {
        if self.json {
            return self.print_json(students);
        }
        for student in students {
            println!(
                "{:<32} {:<16} {:<7} {}",
                student.name,
                student.contact,
                student.due_day.label(),
                format_brl(student.monthly_fee)
            );
        }
        Ok(())
    }

    fn status(&self, name: &str, month: &str, status: &PaymentStatus) -> Result<()> {
        if self.json {
            return self.print_json(status);
        }
        match status {
            PaymentStatus::Paid(entry) => {
                println!("{name} {month}: PAGO ({})", format_brl(entry.amount))
            }
            PaymentStatus::Pending => println!("{name} {month}: PENDENTE"),
        }
        Ok(())
    }

    fn history(
        &self,
        student: &Student,
        history: &[(MonthKey, PaymentStatus)],
    ) -> Result<()> {
        if self.json {
            let months: Vec<_> = history
                .iter()
                .map(|(key, status)| serde_json::json!({ "month": key.to_string(), "payment": status }))
                .collect();
            return self.print_json(&serde_json::json!({ "student": student, "history": months }));
        }

        println!("{} ({})", student.name, student.contact);
        println!(
            "vencimento {}, mensalidade {}",
            student.due_day.label(),
            format_brl(student.monthly_fee)
        );
        if student.pending_document.is_pending() {
            println!(
                "documentação pendente ({}): {}",
                student.pending_document, student.pending_document_note
            );
        }
        for (key, status) in history {
            match status {
                PaymentStatus::Paid(entry) => {
                    println!("  {:<16} PAGO     {}", key.to_string(), format_brl(entry.amount))
                }
                PaymentStatus::Pending => println!("  {:<16} PENDENTE", key.to_string()),
            }
        }
        Ok(())
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Track tuition payments and cash flow stored in the school workbook."
)]
struct Cli {
    /// Workbook holding the roster and monthly ledgers.
    #[arg(long, global = true, default_value = "planilha atualizada 2026.xlsx")]
    workbook: PathBuf,

    /// JSON settings file overriding the layout defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// How ledger entries are matched to students.
    #[arg(long, global = true, value_enum)]
    match_mode: Option<MatchModeKind>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List students, optionally filtered by name.
    Students {
        #[arg(long)]
        filter: Option<String>,
    },
    /// Show a student's record and payment history.
    Show { name: String },
    /// Enroll a new student.
    Enroll(EnrollArgs),
    /// Edit a student's record.
    Edit(EditArgs),
    /// Payment status of a student in a month.
    Status { name: String, month: String },
    /// Record a tuition payment.
    Pay(PayArgs),
    /// Remove a recorded tuition payment.
    Undo(UndoArgs),
    /// Record an expense.
    Expense(ExpenseArgs),
    /// Students without a payment in a month.
    Pending { month: String },
    /// Income, expense, and balance of a month.
    Totals { month: String },
    /// Write the workbook with recomputed totals.
    Export {
        #[arg(long)]
        output: PathBuf,
    },
}

#[derive(clap::Args)]
struct SaveArgs {
    /// Where to write the updated workbook. Defaults to the input workbook.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
struct StudentArgs {
    #[arg(long)]
    contact: Option<String>,
    /// Due day, e.g. "DIA 15" or 15.
    #[arg(long, value_parser = parse_due_day)]
    due_day: Option<DueDay>,
    #[arg(long)]
    monthly_fee: Option<Decimal>,
    /// Enrollment date (YYYY-MM-DD).
    #[arg(long)]
    enrollment_date: Option<NaiveDate>,
    #[arg(long)]
    enrollment_fee: Option<Decimal>,
    /// Scholarship tier; an empty value clears it.
    #[arg(long)]
    scholarship: Option<String>,
    /// Pending paperwork: "SIM", "--", or free text such as "Cursando".
    #[arg(long, value_parser = parse_pending_document)]
    pending_document: Option<PendingDocument>,
    #[arg(long)]
    pending_note: Option<String>,
}

impl StudentArgs {
    fn into_fields(self, name: Option<String>) -> StudentFields {
        StudentFields {
            name,
            contact: self.contact,
            due_day: self.due_day,
            monthly_fee: self.monthly_fee,
            enrollment_date: self.enrollment_date,
            enrollment_fee: self.enrollment_fee,
            scholarship: self.scholarship,
            pending_document: self.pending_document,
            pending_document_note: self.pending_note,
        }
    }
}

#[derive(clap::Args)]
struct EnrollArgs {
    name: String,
    #[command(flatten)]
    fields: StudentArgs,
    #[command(flatten)]
    save: SaveArgs,
}

#[derive(clap::Args)]
struct EditArgs {
    name: String,
    /// New full name.
    #[arg(long)]
    rename: Option<String>,
    #[command(flatten)]
    fields: StudentArgs,
    #[command(flatten)]
    save: SaveArgs,
}

#[derive(clap::Args)]
struct PayArgs {
    name: String,
    month: String,
    #[arg(long)]
    amount: Decimal,
    /// Payment date as typed in the ledger. Defaults to today.
    #[arg(long)]
    date: Option<String>,
    #[arg(long, default_value = "PIX")]
    method: String,
    #[command(flatten)]
    save: SaveArgs,
}

#[derive(clap::Args)]
struct UndoArgs {
    name: String,
    month: String,
    #[command(flatten)]
    save: SaveArgs,
}

#[derive(clap::Args)]
struct ExpenseArgs {
    month: String,
    description: String,
    /// Cost of the expense as a positive number.
    #[arg(long)]
    amount: Decimal,
    #[arg(long)]
    date: Option<String>,
    #[command(flatten)]
    save: SaveArgs,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum MatchModeKind {
    FirstName,
    Keyed,
}

impl From<MatchModeKind> for MatchMode {
    fn from(kind: MatchModeKind) -> Self {
        match kind {
            MatchModeKind::FirstName => MatchMode::FirstName,
            MatchModeKind::Keyed => MatchMode::Keyed,
        }
    }
}

fn parse_due_day(raw: &str) -> std::result::Result<DueDay, String> {
    DueDay::parse(raw).ok_or_else(|| format!("unknown due day '{raw}' (expected DIA 05/10/15/20/30)"))
}

fn parse_pending_document(raw: &str) -> std::result::Result<PendingDocument, String> {
    Ok(PendingDocument::parse(raw))
}
