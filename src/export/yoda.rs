use std::io::Write;

use anyhow::Result;

use crate::{
    analysis::Results,
    histogram::{Bin, Histo1D, Scatter2D},
};

pub(crate) fn export_yoda(mut out: impl Write, results: &Results) -> Result<()> {
    for histo in &results.histos {
        write_histo(&mut out, histo)?;
    }
    for scatter in &results.ratios {
        write_scatter(&mut out, scatter)?;
    }
    Ok(())
}

fn write_histo(mut out: impl Write, histo: &Histo1D) -> Result<()> {
    let path = &histo.path;
    writeln!(out, "BEGIN YODA_HISTO1D_V2 {path}")?;
    writeln!(out, "Path: {path}")?;
    writeln!(out, "Title: ")?;
    writeln!(out, "Type: Histo1D")?;
    writeln!(out, "---")?;
    let total = histo
        .bins()
        .iter()
        .chain([histo.underflow(), histo.overflow()])
        .fold(Bin::default(), |mut total, bin| {
            total.sumw += bin.sumw;
            total.sumw2 += bin.sumw2;
            total.sumwx += bin.sumwx;
            total.sumwx2 += bin.sumwx2;
            total.entries += bin.entries;
            total
        });
    let mean = if total.sumw != 0. {
        total.sumwx / total.sumw
    } else {
        f64::NAN
    };
    writeln!(out, "# Mean: {mean:.6e}")?;
    writeln!(out, "# Area: {:.6e}", total.sumw)?;
    writeln!(out, "# ID\t ID\t sumw\t sumw2\t sumwx\t sumwx2\t numEntries")?;
    write_bin(&mut out, "Total   ", "Total   ", &total)?;
    write_bin(&mut out, "Underflow", "Underflow", histo.underflow())?;
    write_bin(&mut out, "Overflow", "Overflow", histo.overflow())?;
    writeln!(out, "# xlow\t xhigh\t sumw\t sumw2\t sumwx\t sumwx2\t numEntries")?;
    for (edges, bin) in histo.edges().windows(2).zip(histo.bins()) {
        let low = format!("{:.6e}", edges[0]);
        let high = format!("{:.6e}", edges[1]);
        write_bin(&mut out, &low, &high, bin)?;
    }
    writeln!(out, "END YODA_HISTO1D_V2")?;
    writeln!(out)?;
    Ok(())
}

fn write_bin(mut out: impl Write, first: &str, second: &str, bin: &Bin) -> Result<()> {
    writeln!(
        out,
        "{first}\t{second}\t{:.6e}\t{:.6e}\t{:.6e}\t{:.6e}\t{:.6e}",
        bin.sumw, bin.sumw2, bin.sumwx, bin.sumwx2, bin.entries as f64
    )?;
    Ok(())
}

fn write_scatter(mut out: impl Write, scatter: &Scatter2D) -> Result<()> {
    let path = &scatter.path;
    writeln!(out, "BEGIN YODA_SCATTER2D_V2 {path}")?;
    writeln!(out, "Path: {path}")?;
    writeln!(out, "Title: ")?;
    writeln!(out, "Type: Scatter2D")?;
    writeln!(out, "---")?;
    writeln!(out, "# xval\t xerr-\t xerr+\t yval\t yerr-\t yerr+")?;
    for point in &scatter.points {
        let y = point.y.unwrap_or(f64::NAN);
        let ey = point.ey.unwrap_or(f64::NAN);
        writeln!(
            out,
            "{:.6e}\t{:.6e}\t{:.6e}\t{y:.6e}\t{ey:.6e}\t{ey:.6e}",
            point.x, point.ex, point.ex
        )?;
    }
    writeln!(out, "END YODA_SCATTER2D_V2")?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::divide;

    #[test]
    fn histo_block() {
        let mut histo = Histo1D::new("/TEST/h", vec![0., 1., 2.]).unwrap();
        histo.fill(0.5, 2.);
        histo.fill(3., 1.);
        let mut out = Vec::new();
        write_histo(&mut out, &histo).unwrap();
        let out = String::from_utf8(out).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines[0], "BEGIN YODA_HISTO1D_V2 /TEST/h");
        assert!(lines.contains(&"Path: /TEST/h"));
        assert!(lines.contains(&"# Area: 3.000000e0"));
        assert!(lines.contains(
            &"Overflow\tOverflow\t1.000000e0\t1.000000e0\t3.000000e0\t9.000000e0\t1.000000e0"
        ));
        assert!(lines.contains(
            &"0.000000e0\t1.000000e0\t2.000000e0\t4.000000e0\t1.000000e0\t5.000000e-1\t1.000000e0"
        ));
        assert!(out.ends_with("END YODA_HISTO1D_V2\n\n"));
        assert_eq!(lines.iter().filter(|l| l.is_empty()).count(), 1);
    }

    #[test]
    fn undefined_ratio_points() {
        let mut num = Histo1D::new("/TEST/num", vec![0., 1., 2.]).unwrap();
        let den = num.clone();
        num.fill(0.5, 1.);
        let ratio = divide("/TEST/ratio", &num, &den).unwrap();
        let mut out = Vec::new();
        write_scatter(&mut out, &ratio).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("BEGIN YODA_SCATTER2D_V2 /TEST/ratio\n"));
        assert_eq!(out.matches("NaN").count(), 6);
        assert!(out.contains("END YODA_SCATTER2D_V2"));
    }
}
