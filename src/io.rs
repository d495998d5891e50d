use crate::model::{Assignment, Employee, Role};
use crate::scheduler::DayAvailability;
use anyhow::{bail, Context};
use csv::{ReaderBuilder, WriterBuilder};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Ligne d'import avant enregistrement dans l'annuaire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    pub name: String,
    pub role: Role,
}

/// Import du personnel depuis CSV: header `name,role`
pub fn import_employees_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<NewEmployee>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut out = Vec::new();
    for (line, rec) in rdr.records().enumerate() {
        let rec = rec?;
        let name = rec.get(0).context("missing name")?.trim();
        let role = rec.get(1).context("missing role")?.trim();
        if name.is_empty() {
            bail!("invalid employee row {} (empty name)", line + 1);
        }
        let role = role
            .parse::<Role>()
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("invalid role for {name}"))?;
        out.push(NewEmployee {
            name: name.to_string(),
            role,
        });
    }
    Ok(out)
}

/// CSV des assignations: header `assignment_id,date,slot,start,end,employee_id,employee_name,role`
pub fn write_shifts_csv<W: Write>(
    writer: W,
    assignments: &[Assignment],
    employees: &[Employee],
) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(false).from_writer(writer);
    w.write_record([
        "assignment_id",
        "date",
        "slot",
        "start",
        "end",
        "employee_id",
        "employee_name",
        "role",
    ])?;
    for a in assignments {
        let name = employees
            .iter()
            .find(|e| e.id == a.employee)
            .map(|e| e.name.as_str())
            .unwrap_or("");
        let (start, end) = a.number.window_on(a.date);
        w.write_record([
            a.id.get().to_string().as_str(),
            a.date.to_string().as_str(),
            a.number.to_string().as_str(),
            start.to_rfc3339().as_str(),
            end.to_rfc3339().as_str(),
            a.employee.get().to_string().as_str(),
            name,
            a.role.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

pub fn export_shifts_csv<P: AsRef<Path>>(
    path: P,
    assignments: &[Assignment],
    employees: &[Employee],
) -> anyhow::Result<()> {
    let mut buf = Vec::new();
    write_shifts_csv(&mut buf, assignments, employees)?;
    write_atomic(path.as_ref(), &buf)
}

/// Export JSON de la grille de disponibilité (jolie mise en forme)
pub fn export_availability_json<P: AsRef<Path>>(
    path: P,
    grid: &[DayAvailability],
) -> anyhow::Result<()> {
    let json = serde_json::to_vec_pretty(grid)?;
    write_atomic(path.as_ref(), &json)
}

fn write_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).with_context(|| "creating temp file")?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .with_context(|| format!("atomic rename to {}", path.display()))?;
    Ok(())
}
