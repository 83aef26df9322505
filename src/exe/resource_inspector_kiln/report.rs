use graphics_kiln::ResourceReport;
use nab_kiln::format_binary;
use std::fmt::Write;

const HEADER: [&str; 7] = ["type", "live", "created", "freed", "hits", "failed", "memory"];

fn memory_column(report: &ResourceReport) -> String
{
    match (report.host_bytes, report.device_bytes)
    {
        (0, 0) => "-".to_string(),
        (host, 0) => format!("{:#.1}B host", format_binary!(host)),
        (0, device) => format!("{:#.1}B device", format_binary!(device)),
        (host, device) => format!("{:#.1}B host, {:#.1}B device", format_binary!(host), format_binary!(device)),
    }
}

/// One aligned row per resource kind
#[must_use]
pub fn format_report(reports: &[ResourceReport]) -> String
{
    let rows: Vec<[String; 7]> = reports.iter().map(|r|
    [
        r.type_tag.to_string(),
        r.stats.live.to_string(),
        r.stats.created.to_string(),
        r.stats.freed.to_string(),
        r.stats.hits.to_string(),
        r.stats.failures.to_string(),
        memory_column(r),
    ]).collect();

    let mut widths = HEADER.map(str::len);
    for row in &rows
    {
        for (width, cell) in widths.iter_mut().zip(row)
        {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    let mut write_row = |cells: [&str; 7]|
    {
        let _ = write!(out, "{:<w$}", cells[0], w = widths[0]);
        for (cell, &width) in cells[1..6].iter().zip(&widths[1..6])
        {
            let _ = write!(out, "  {cell:>width$}");
        }
        let _ = writeln!(out, "  {}", cells[6]);
    };

    write_row(HEADER);
    for row in &rows
    {
        write_row(row.each_ref().map(String::as_str));
    }
    out
}
