#![allow(dead_code)]

use std::path::{Path, PathBuf};

use rust_xlsxwriter::Workbook;

pub enum Cell {
    Text(String),
    Number(f64),
    Blank,
}

pub fn text(value: &str) -> Cell {
    Cell::Text(value.to_string())
}

pub fn num(value: f64) -> Cell {
    Cell::Number(value)
}

pub struct SheetSpec {
    pub name: String,
    pub header_row: u32,
    pub title: bool,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl SheetSpec {
    pub fn new(name: &str, header_row: u32, headers: &[&str], rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.to_string(),
            header_row,
            title: true,
            headers: headers.iter().map(|header| header.to_string()).collect(),
            rows,
        }
    }

    pub fn without_title(mut self) -> Self {
        self.title = false;
        self
    }
}

pub fn write_fixture(path: &Path, sheets: &[SheetSpec]) {
    let mut workbook = Workbook::new();
    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name).expect("sheet named");
        if sheet.title && sheet.header_row > 0 {
            worksheet
                .write_string(0, 0, "STAR TEC - POLO UBATÃ")
                .expect("title written");
        }
        for (col, header) in sheet.headers.iter().enumerate() {
            worksheet
                .write_string(sheet.header_row, col as u16, header)
                .expect("header written");
        }
        for (offset, row) in sheet.rows.iter().enumerate() {
            let row_idx = sheet.header_row + 1 + offset as u32;
            for (col, cell) in row.iter().enumerate() {
                match cell {
                    Cell::Text(value) => {
                        worksheet
                            .write_string(row_idx, col as u16, value)
                            .expect("cell written");
                    }
                    Cell::Number(value) => {
                        worksheet
                            .write_number(row_idx, col as u16, *value)
                            .expect("cell written");
                    }
                    Cell::Blank => {}
                }
            }
        }
    }
    workbook.save(path).expect("fixture saved");
}

pub fn roster_sheet(rows: Vec<Vec<Cell>>) -> SheetSpec {
    // Only part of the roster columns, with untrimmed headers.
    SheetSpec::new(
        "Alunos",
        3,
        &["Aluno", " Contato ", "Vencimento", "Mensalidade"],
        rows,
    )
}

pub fn month_sheet(name: &str, rows: Vec<Vec<Cell>>) -> SheetSpec {
    SheetSpec::new(
        name,
        1,
        &["Data", "Lançamento", "Valor", "Forma de Pagamento"],
        rows,
    )
}

/// Four students, a January sheet named with the year suffix, a February
/// sheet without the payment-method column, and one historical month.
pub fn sample_sheets() -> Vec<SheetSpec> {
    vec![
        roster_sheet(vec![
            vec![text("Maria Silva"), text("73 99999-0001"), text("DIA 15"), num(200.0)],
            vec![text("Joao Souza"), Cell::Blank, text("DIA 10"), text("R$ 180,00")],
            vec![text("Joao Pereira"), Cell::Blank, text("dia 05"), text("abc")],
            vec![Cell::Blank, text("sem nome"), text("DIA 20"), num(300.0)],
            vec![text("Ana Costa"), Cell::Blank, Cell::Blank, num(250.0)],
        ]),
        month_sheet(
            "JANEIRO.2026",
            vec![
                vec![
                    text("05/01/2026"),
                    text("Mensalidade Joao Souza"),
                    num(180.0),
                    text("PIX"),
                ],
                vec![text("07/01/2026"), text("DESPESA - Luz"), num(-150.0), Cell::Blank],
                vec![Cell::Blank, Cell::Blank, Cell::Blank, Cell::Blank],
            ],
        ),
        SheetSpec::new(
            "Fevereiro",
            1,
            &["Data", "Lançamento", "Valor"],
            vec![vec![
                text("10/02/2026"),
                text("Mensalidade Maria Silva"),
                num(200.0),
            ]],
        ),
        month_sheet(
            "JANEIRO.2025",
            vec![vec![
                text("12/01/2025"),
                text("mensalidade ana costa"),
                num(250.0),
                text("Dinheiro"),
            ]],
        ),
    ]
}

pub fn sample_workbook(dir: &Path) -> PathBuf {
    let path = dir.join("planilha.xlsx");
    write_fixture(&path, &sample_sheets());
    path
}
