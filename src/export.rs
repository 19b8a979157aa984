//! Result tables and the sinks they are written to

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::{info, warn};

use crate::pipeline::AnalyticsReport;
use crate::rfm::RfmProfile;
use crate::rules::AssociationRule;
use crate::weekly::WeeklySummary;

pub const RFM_TABLE: &str = "rfm_customer_scores";
pub const RULES_TABLE: &str = "market_basket_rules";
pub const WEEKLY_TABLE: &str = "weekly_sales_summary";

/// Destination for named result tables
///
/// Tables are staged first and only become visible on `commit`, which
/// replaces every staged table in full. `discard` drops staged tables and
/// leaves the previous versions untouched.
pub trait TableSink {
    fn stage_table(&mut self, name: &str, table: &mut DataFrame) -> crate::Result<()>;

    fn commit(&mut self) -> crate::Result<()>;

    fn discard(&mut self);
}

/// Writes each table as `<dir>/<name>.csv`
#[derive(Debug, Clone)]
pub struct CsvDirectorySink {
    dir: PathBuf,
    staged: Vec<(String, PathBuf)>,
}

impl CsvDirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            staged: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.csv"))
    }

    fn staging_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!(".{name}.csv.tmp"))
    }
}

impl TableSink for CsvDirectorySink {
    fn stage_table(&mut self, name: &str, table: &mut DataFrame) -> crate::Result<()> {
        fs::create_dir_all(&self.dir)?;

        let staging = self.staging_path(name);
        let mut file = File::create(&staging)?;
        // tracked before writing so a failed write is still cleaned up
        self.staged.push((name.to_string(), staging));
        CsvWriter::new(&mut file).include_header(true).finish(table)?;
        file.sync_all()?;
        Ok(())
    }

    fn commit(&mut self) -> crate::Result<()> {
        for (name, staging) in std::mem::take(&mut self.staged) {
            let target = self.path_for(&name);
            fs::rename(&staging, &target)?;
            info!(table = %name, path = %target.display(), "table written");
        }
        Ok(())
    }

    fn discard(&mut self) {
        for (name, staging) in self.staged.drain(..) {
            if let Err(err) = fs::remove_file(&staging) {
                warn!(table = %name, error = %err, "could not remove staging file");
            }
        }
    }
}

/// The three tables of one run, with their published column names
#[derive(Debug, Clone)]
pub struct ResultTables {
    pub rfm: DataFrame,
    pub rules: DataFrame,
    pub weekly: DataFrame,
}

impl ResultTables {
    pub fn from_report(report: &AnalyticsReport) -> crate::Result<Self> {
        Ok(Self {
            rfm: rfm_frame(&report.profiles)?,
            rules: rules_frame(&report.rules)?,
            weekly: weekly_frame(&report.weekly)?,
        })
    }

    /// Replace all three tables in `sink`, or none of them
    pub fn write_to(mut self, sink: &mut dyn TableSink) -> crate::Result<()> {
        let staged = sink
            .stage_table(RFM_TABLE, &mut self.rfm)
            .and_then(|_| sink.stage_table(RULES_TABLE, &mut self.rules))
            .and_then(|_| sink.stage_table(WEEKLY_TABLE, &mut self.weekly));
        if let Err(err) = staged {
            sink.discard();
            return Err(err);
        }
        sink.commit()
    }
}

pub fn rfm_frame(profiles: &[RfmProfile]) -> crate::Result<DataFrame> {
    let score = |f: fn(&RfmProfile) -> u8| -> Vec<u32> {
        profiles.iter().map(|p| u32::from(f(p))).collect()
    };

    let df = df!(
        "customer_id" => profiles.iter().map(|p| p.customer_id).collect::<Vec<_>>(),
        "recency" => profiles.iter().map(|p| p.recency).collect::<Vec<_>>(),
        "frequency" => profiles.iter().map(|p| p.frequency).collect::<Vec<_>>(),
        "monetary" => profiles.iter().map(|p| p.monetary).collect::<Vec<_>>(),
        "R_score" => score(|p| p.r_score.get()),
        "F_score" => score(|p| p.f_score.get()),
        "M_score" => score(|p| p.m_score.get()),
        "RFM_Score" => profiles.iter().map(|p| p.rfm_code.as_str()).collect::<Vec<_>>(),
        "segment" => profiles.iter().map(|p| p.segment.as_str()).collect::<Vec<_>>(),
        "region" => profiles.iter().map(|p| p.region.as_str()).collect::<Vec<_>>()
    )?;
    Ok(df)
}

pub fn rules_frame(rules: &[AssociationRule]) -> crate::Result<DataFrame> {
    let df = df!(
        "antecedents" => rules.iter().map(|r| r.antecedent.to_string()).collect::<Vec<_>>(),
        "consequents" => rules.iter().map(|r| r.consequent.to_string()).collect::<Vec<_>>(),
        "support" => rules.iter().map(|r| r.support).collect::<Vec<_>>(),
        "confidence" => rules.iter().map(|r| r.confidence).collect::<Vec<_>>(),
        "lift" => rules.iter().map(|r| r.lift).collect::<Vec<_>>()
    )?;
    Ok(df)
}

pub fn weekly_frame(weekly: &[WeeklySummary]) -> crate::Result<DataFrame> {
    let df = df!(
        "week" => weekly.iter().map(|w| w.week.to_string()).collect::<Vec<_>>(),
        "total_orders" => weekly.iter().map(|w| w.total_orders).collect::<Vec<_>>(),
        "total_revenue" => weekly.iter().map(|w| w.total_revenue).collect::<Vec<_>>()
    )?;
    Ok(df)
}
