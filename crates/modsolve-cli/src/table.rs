use modsolve::workflows::simulate::TimeSeries;
use modsolve::workflows::static_solve::StaticReport;
use std::io::{self, Write};

const RULE: &str = "--------------------";

/// Writes one labeled name/value block in the static result format.
pub fn write_value_block(
    w: &mut impl Write,
    label: &str,
    names: &[String],
    values: &[f64],
) -> io::Result<()> {
    writeln!(w)?;
    writeln!(w, "{}", label)?;
    writeln!(w, "{}", RULE)?;
    writeln!(w, "Name      value")?;
    writeln!(w, "{}", RULE)?;
    for (name, value) in names.iter().zip(values) {
        writeln!(w, "{}: {}", name, value)?;
    }
    writeln!(w, "{}", RULE)?;
    Ok(())
}

/// Writes a full static report, one block per section.
pub fn write_static_report(w: &mut impl Write, report: &StaticReport) -> io::Result<()> {
    for block in &report.blocks {
        write_value_block(w, &block.label, &block.names, &block.values)?;
    }
    Ok(())
}

/// Writes the space-delimited header row: `t name1 name2 ...`.
pub fn write_series_header(w: &mut impl Write, names: &[String]) -> io::Result<()> {
    write!(w, "t")?;
    for name in names {
        write!(w, " {}", name)?;
    }
    writeln!(w)
}

/// Writes one numeric row: the time followed by the output values.
pub fn write_series_row(w: &mut impl Write, t: f64, values: &[f64]) -> io::Result<()> {
    write!(w, "{}", t)?;
    for value in values {
        write!(w, " {}", value)?;
    }
    writeln!(w)
}

/// Writes a full time series as a header plus one row per sample.
pub fn write_time_series(w: &mut impl Write, series: &TimeSeries) -> io::Result<()> {
    write_series_header(w, &series.names)?;
    for (t, values) in &series.rows {
        write_series_row(w, *t, values)?;
    }
    Ok(())
}
