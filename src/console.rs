//! Operator-facing console flows: employee self-service and the gate check.
//!
//! Both are driven over any `BufRead`/`Write` pair. End of input ends a flow
//! cleanly. Engine errors are printed for the operator, never propagated;
//! only I/O errors escape.

use std::io::{self, BufRead, Write};

use tracing::debug;

use crate::dates::CalendarDate;
use crate::engine::{Engine, EngineError, RecordStore};
use crate::ledger::{DateRequest, Schedule};
use crate::model::{EmployeeId, EmployeeRecord};

const RESERVE_PROMPT: &str = "Enter the date (range) you would like to reserve for \
    (format: DD-MM-YYYY--DD-MM-YYYY or just DD-MM-YYYY if a single day): ";
const OPT_OUT_PROMPT: &str = "Enter the date (range) you would like to open your space for \
    (format: DD-MM-YYYY--DD-MM-YYYY, DD-MM-YYYY if a single day, or 'always'): ";

/// Read one trimmed line; `None` at end of input.
fn read_line(input: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn prompt(output: &mut impl Write, input: &mut impl BufRead, text: &str) -> io::Result<Option<String>> {
    write!(output, "{text}")?;
    output.flush()?;
    read_line(input)
}

/// Print records as a fixed-width table.
pub fn render_records(output: &mut impl Write, records: &[EmployeeRecord]) -> io::Result<()> {
    writeln!(output)?;
    writeln!(
        output,
        "EmployeeID | Registration No. | Status                   | Eco Car | Distance (km) | Reserved Dates"
    )?;
    writeln!(
        output,
        "{:<11}|{:<18}|{:<26}|{:<9}|{:<15}|",
        "", "", "", "", ""
    )?;
    for r in records {
        writeln!(
            output,
            "{:<11}| {:<17}| {:<25}| {:<8}| {:<14}| {}",
            r.employee_id,
            r.registration_no,
            r.status.as_str(),
            if r.eco_car { "True" } else { "False" },
            r.distance_km,
            r.reserved_dates
        )?;
    }
    writeln!(output)
}

/// Does `current` hold everything `request` asks to open up?
fn holds(current: &Schedule, request: DateRequest) -> bool {
    match request {
        DateRequest::Always => !current.is_none(),
        DateRequest::Day(day) => current.is_covered_over_range(day, day),
        DateRequest::Range(start, end) => current.is_covered_over_range(start, end),
    }
}

/// Menu-driven flow for one employee.
pub struct EmployeeConsole<'a, S: RecordStore, R, W> {
    engine: &'a mut Engine<S>,
    input: R,
    output: W,
    today: CalendarDate,
}

impl<'a, S: RecordStore, R: BufRead, W: Write> EmployeeConsole<'a, S, R, W> {
    pub fn new(engine: &'a mut Engine<S>, input: R, output: W, today: CalendarDate) -> Self {
        Self { engine, input, output, today }
    }

    pub fn run(&mut self) -> io::Result<()> {
        let Some(id) = self.ask_id()? else { return Ok(()) };
        debug!(employee = id, "employee session started");
        loop {
            writeln!(self.output, "\nMenu:")?;
            writeln!(self.output, "1. Reserve a space")?;
            writeln!(self.output, "2. Open up your space to others")?;
            writeln!(self.output, "3. View your current reserved dates")?;
            writeln!(self.output, "4. Quit program")?;
            let Some(choice) = prompt(&mut self.output, &mut self.input, "Enter your choice: ")? else {
                break;
            };
            match choice.as_str() {
                "1" => self.reserve(id)?,
                "2" => self.open_up(id)?,
                "3" => self.view(id)?,
                "4" => break,
                _ => writeln!(self.output, "Please choose 1, 2, 3 or 4.")?,
            }
        }
        debug!(employee = id, "employee session ended");
        Ok(())
    }

    fn ask_id(&mut self) -> io::Result<Option<EmployeeId>> {
        loop {
            let Some(text) = prompt(&mut self.output, &mut self.input, "Enter your ID: ")? else {
                return Ok(None);
            };
            let Ok(id) = text.parse::<EmployeeId>() else {
                writeln!(self.output, "Please enter a numeric ID.")?;
                continue;
            };
            match self.engine.record(id) {
                Ok(_) => return Ok(Some(id)),
                Err(e) => writeln!(self.output, "{e}")?,
            }
        }
    }

    fn show_record(&mut self, id: EmployeeId) -> io::Result<()> {
        match self.engine.record(id) {
            Ok(record) => render_records(&mut self.output, &[record]),
            Err(e) => writeln!(self.output, "{e}"),
        }
    }

    fn reserve(&mut self, id: EmployeeId) -> io::Result<()> {
        writeln!(self.output)?;
        let record = match self.engine.record(id) {
            Ok(record) => record,
            Err(e) => return writeln!(self.output, "{e}"),
        };

        if !record.status.is_discretionary() {
            writeln!(self.output, "Your space is automatically reserved.")?;
        } else if self.engine.free_spaces() == 0 {
            writeln!(self.output, "There are no more free spaces.")?;
        } else {
            let Some(text) = prompt(&mut self.output, &mut self.input, RESERVE_PROMPT)? else {
                return Ok(());
            };
            match text.parse::<DateRequest>() {
                Err(e) => writeln!(self.output, "{e}")?,
                Ok(request) => match self.engine.reserve(id, request) {
                    Ok(_) => writeln!(self.output, "\nReserve successful. Updated record:")?,
                    Err(e) => writeln!(self.output, "\nReserve failed: {e}")?,
                },
            }
        }
        self.show_record(id)
    }

    fn open_up(&mut self, id: EmployeeId) -> io::Result<()> {
        writeln!(self.output)?;
        let current = match self.engine.schedule_of(id) {
            Ok(schedule) => schedule,
            Err(e) => return writeln!(self.output, "{e}"),
        };
        if current.is_none() {
            return writeln!(self.output, "You have no dates reserved.");
        }

        let request = loop {
            let Some(text) = prompt(&mut self.output, &mut self.input, OPT_OUT_PROMPT)? else {
                return Ok(());
            };
            match text.parse::<DateRequest>() {
                Err(e) => writeln!(self.output, "{e}")?,
                Ok(request) if holds(&current, request) => break request,
                Ok(_) => writeln!(
                    self.output,
                    "You do not have a reserved space in this date range. Please enter a valid date range."
                )?,
            }
        };

        match self.engine.opt_out_on(id, request, self.today) {
            Ok(_) => {
                writeln!(self.output, "\nOpt out successful. Updated record:")?;
                self.show_record(id)
            }
            Err(e) => writeln!(self.output, "\nOpt out failed: {e}"),
        }
    }

    fn view(&mut self, id: EmployeeId) -> io::Result<()> {
        writeln!(self.output)?;
        match self.engine.record(id) {
            Ok(record) => writeln!(self.output, "Current reserved dates: {}", record.reserved_dates),
            Err(e) => writeln!(self.output, "{e}"),
        }
    }
}

/// Registration lookup loop run at the car park entrance.
pub struct GateConsole<'a, S: RecordStore, R, W> {
    engine: &'a Engine<S>,
    input: R,
    output: W,
    today: CalendarDate,
}

impl<'a, S: RecordStore, R: BufRead, W: Write> GateConsole<'a, S, R, W> {
    pub fn new(engine: &'a Engine<S>, input: R, output: W, today: CalendarDate) -> Self {
        Self { engine, input, output, today }
    }

    pub fn run(&mut self) -> io::Result<()> {
        loop {
            let Some(registration) = prompt(
                &mut self.output,
                &mut self.input,
                "\nEnter registration no. ('end' if no more cars): ",
            )?
            else {
                break;
            };
            if registration == "end" {
                break;
            }
            if registration.is_empty() {
                continue;
            }

            match self.engine.gate_check(&registration, self.today) {
                Ok(verdicts) => {
                    for verdict in verdicts {
                        if verdict.reserved {
                            writeln!(self.output, "Car has space reserved.")?;
                        } else {
                            writeln!(self.output, "Car has no space reserved.")?;
                        }
                    }
                }
                Err(EngineError::RecordNotFound(_)) => {
                    writeln!(self.output, "Registration No. was not found in database.")?;
                }
                Err(e) => writeln!(self.output, "Lookup failed: {e}")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Status;

    fn d(s: &str) -> CalendarDate {
        s.parse().unwrap()
    }

    #[test]
    fn table_row_layout() {
        let record = EmployeeRecord {
            employee_id: 7,
            registration_no: "AB12CDE".into(),
            status: Status::Other,
            eco_car: true,
            distance_km: 12,
            reserved_dates: "None".into(),
        };
        let mut out = Vec::new();
        render_records(&mut out, &[record]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let row = text.lines().find(|l| l.starts_with('7')).unwrap();
        assert_eq!(
            row,
            "7          | AB12CDE          | Other                    | True    | 12            | None"
        );
    }

    #[test]
    fn holds_checks_whole_request() {
        let current: Schedule = "10-01-2024--20-01-2024".parse().unwrap();
        assert!(holds(&current, DateRequest::Day(d("12-01-2024"))));
        assert!(holds(&current, DateRequest::Range(d("10-01-2024"), d("20-01-2024"))));
        assert!(!holds(&current, DateRequest::Range(d("10-01-2024"), d("21-01-2024"))));
        assert!(holds(&current, DateRequest::Always));
        assert!(!holds(&Schedule::None, DateRequest::Always));
        assert!(holds(&Schedule::Always, DateRequest::Day(d("01-01-2030"))));
    }
}
