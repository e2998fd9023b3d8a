//! Periodic progress reports and where they go.

use serde::{Deserialize, Serialize};
use ssp_core::{PathDisplay, Point, Result};
use std::fmt;
use std::io::Write;
use tracing::info;

/// Observation number that also prints the best path on its own line.
pub const EXTENDED_REPORT_AT: u32 = 20;

/// Ranking criterion of the best path at the time of a report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BestMeasure {
    /// Goal reached: lowest cost among individuals that reached it, if one
    /// has been recorded yet
    Cost(Option<u32>),
    /// Goal not reached: highest comfort seen so far
    Comfort(f64),
}

/// Snapshot of a run taken by an Observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationReport {
    /// 1-based observation counter
    pub number: u32,
    /// Simulation clock when the observation fired
    pub instant: f64,
    /// Death, Move and Reproduction events executed so far
    pub event_count: u64,
    pub population: usize,
    pub goal_reached: bool,
    pub best_path: Vec<Point>,
    pub measure: BestMeasure,
    /// Whether the best path is repeated on a final summary line
    pub extended: bool,
}

impl fmt::Display for ObservationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = PathDisplay(&self.best_path);

        writeln!(f, "Observation number {}:", self.number)?;
        writeln!(f, "\t\t\tPresent instant:\t{:.1}", self.instant.floor())?;
        writeln!(f, "\t\t\tNumber of realised events:\t{}", self.event_count)?;
        writeln!(f, "\t\t\tPopulation size:\t{}", self.population)?;
        writeln!(f, "\t\t\tFinal point has been hit:\t{}", self.goal_reached)?;
        writeln!(f, "\t\t\tPath of the best fit individual:\t{}", path)?;
        match self.measure {
            BestMeasure::Cost(Some(cost)) => write!(f, "\t\t\tCost:\t{}", cost)?,
            BestMeasure::Cost(None) => write!(f, "\t\t\tCost:\tnone")?,
            BestMeasure::Comfort(comfort) => write!(f, "\t\t\tComfort:\t{}", comfort)?,
        }

        if self.extended {
            write!(f, "\n\n\nPath of the best fit individual = {}", path)?;
        }
        Ok(())
    }
}

/// Destination of observation reports.
pub trait ObservationSink {
    fn observe(&mut self, report: &ObservationReport) -> Result<()>;
}

impl<S: ObservationSink + ?Sized> ObservationSink for &mut S {
    fn observe(&mut self, report: &ObservationReport) -> Result<()> {
        (**self).observe(report)
    }
}

/// Collects every report in memory.
impl ObservationSink for Vec<ObservationReport> {
    fn observe(&mut self, report: &ObservationReport) -> Result<()> {
        self.push(report.clone());
        Ok(())
    }
}

/// Emits reports as structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ObservationSink for TracingSink {
    fn observe(&mut self, report: &ObservationReport) -> Result<()> {
        let path = PathDisplay(&report.best_path).to_string();

        match report.measure {
            BestMeasure::Cost(cost) => info!(
                observation = report.number,
                instant = report.instant.floor(),
                events = report.event_count,
                population = report.population,
                goal_reached = report.goal_reached,
                cost = ?cost,
                path = %path,
                "Observation"
            ),
            BestMeasure::Comfort(comfort) => info!(
                observation = report.number,
                instant = report.instant.floor(),
                events = report.event_count,
                population = report.population,
                goal_reached = report.goal_reached,
                comfort,
                path = %path,
                "Observation"
            ),
        }

        if report.extended {
            info!(path = %path, "Path of the best fit individual");
        }
        Ok(())
    }
}

/// Prints reports in their text layout, each followed by a blank line.
#[derive(Debug)]
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ObservationSink for WriterSink<W> {
    fn observe(&mut self, report: &ObservationReport) -> Result<()> {
        writeln!(self.writer, "{}\n", report)?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(measure: BestMeasure, extended: bool) -> ObservationReport {
        ObservationReport {
            number: 3,
            instant: 15.73,
            event_count: 412,
            population: 37,
            goal_reached: matches!(measure, BestMeasure::Cost(_)),
            best_path: vec![Point::new(1, 1), Point::new(1, 2)],
            measure,
            extended,
        }
    }

    #[test]
    fn test_display_layout_with_cost() {
        let text = report(BestMeasure::Cost(Some(9)), false).to_string();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines,
            vec![
                "Observation number 3:",
                "\t\t\tPresent instant:\t15.0",
                "\t\t\tNumber of realised events:\t412",
                "\t\t\tPopulation size:\t37",
                "\t\t\tFinal point has been hit:\ttrue",
                "\t\t\tPath of the best fit individual:\t{(1,1),(1,2)}",
                "\t\t\tCost:\t9",
            ]
        );
    }

    #[test]
    fn test_display_comfort_and_unset_cost() {
        let text = report(BestMeasure::Comfort(0.25), false).to_string();
        assert!(text.ends_with("\t\t\tComfort:\t0.25"));
        assert!(text.contains("Final point has been hit:\tfalse"));

        let text = report(BestMeasure::Cost(None), false).to_string();
        assert!(text.ends_with("\t\t\tCost:\tnone"));
    }

    #[test]
    fn test_extended_report_repeats_path() {
        let text = report(BestMeasure::Cost(Some(9)), true).to_string();
        assert!(text.ends_with("\n\nPath of the best fit individual = {(1,1),(1,2)}"));
    }

    #[test]
    fn test_writer_sink_separates_reports() {
        let mut sink = WriterSink::new(Vec::new());
        sink.observe(&report(BestMeasure::Cost(Some(9)), false)).unwrap();
        sink.observe(&report(BestMeasure::Comfort(0.5), false)).unwrap();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(output.matches("Observation number 3:").count(), 2);
        assert!(output.contains("Cost:\t9\n\nObservation number 3:"));
        assert!(output.ends_with("Comfort:\t0.5\n\n"));
    }

    #[test]
    fn test_vec_sink_through_reference() {
        fn feed<S: ObservationSink>(mut sink: S, report: &ObservationReport) {
            sink.observe(report).unwrap();
        }

        let mut reports: Vec<ObservationReport> = Vec::new();
        feed(&mut reports, &report(BestMeasure::Comfort(0.1), false));
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].event_count, 412);
    }

    #[test]
    fn test_report_serializes_measure() {
        let json = serde_json::to_string(&report(BestMeasure::Cost(Some(9)), false)).unwrap();
        assert!(json.contains(r#""measure":{"cost":9}"#));
    }
}
