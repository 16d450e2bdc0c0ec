use anyhow::{Context, Result as AnyResult};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;
use tracing::debug;

use super::traits::{Aligner, HitStream, PairHit};
use crate::bio::fasta::{write_proteome, Deflines};
use crate::bio::sequence::Proteome;
use crate::core::config::AlignerConfig;
use crate::{GenomeCmpError, Result};

const BLASTP: &str = "blastp";
const MAKEBLASTDB: &str = "makeblastdb";
const TABULAR_COLUMNS: usize = 12;
const QUERY_PREFIX: &str = "q";
const TARGET_PREFIX: &str = "t";

/// BLAST+ protein aligner
///
/// Each call builds a protein database from the target proteome in its own
/// scratch directory and runs `blastp` with the query proteome against it.
pub struct BlastAligner {
    blastp: PathBuf,
    makeblastdb: PathBuf,
    temp_root: Option<PathBuf>,
    threads: usize,
}

impl BlastAligner {
    pub fn new(blastp: PathBuf, makeblastdb: PathBuf) -> Self {
        Self {
            blastp,
            makeblastdb,
            temp_root: None,
            threads: 1,
        }
    }

    /// Resolve binaries from `blast_bin` when set, otherwise from PATH
    pub fn from_config(config: &AlignerConfig) -> Result<Self> {
        let (blastp, makeblastdb) = match &config.blast_bin {
            Some(dir) => {
                let dir = Path::new(dir);
                (dir.join(BLASTP), dir.join(MAKEBLASTDB))
            }
            None => (find_on_path(BLASTP)?, find_on_path(MAKEBLASTDB)?),
        };

        let mut aligner = Self::new(blastp, makeblastdb).with_threads(config.threads);
        if let Some(temp) = &config.temp_dir {
            aligner = aligner.with_temp_root(PathBuf::from(temp));
        }
        Ok(aligner)
    }

    pub fn with_temp_root(mut self, root: PathBuf) -> Self {
        self.temp_root = Some(root);
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    fn scratch_dir(&self) -> AnyResult<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("genomecmp-blast-");
        let dir = match &self.temp_root {
            Some(root) => {
                std::fs::create_dir_all(root)
                    .with_context(|| format!("Failed to create {}", root.display()))?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        };
        dir.context("Failed to create aligner scratch directory")
    }

    /// Check if BLAST is working
    pub fn check_version(&self) -> AnyResult<String> {
        let output = Command::new(&self.blastp)
            .arg("-version")
            .output()
            .with_context(|| format!("Failed to run {}", self.blastp.display()))?;

        if !output.status.success() {
            anyhow::bail!("{} returned error", BLASTP);
        }

        let version = String::from_utf8_lossy(&output.stdout);
        Ok(version.lines().next().unwrap_or_default().trim().to_string())
    }

    fn run_search(&self, query: &Proteome, target: &Proteome, max_evalue: &str) -> AnyResult<HitStream> {
        let scratch = self.scratch_dir()?;
        let query_path = scratch.path().join("query.faa");
        let target_path = scratch.path().join("target.faa");
        let db_path = scratch.path().join("target_db");
        let output_path = scratch.path().join("hits.tsv");

        // BLAST rewrites deflines with spaces or '|', so records go in by position
        write_proteome(&query_path, query, Deflines::Positional(QUERY_PREFIX))
            .context("Failed to write query proteome")?;
        write_proteome(&target_path, target, Deflines::Positional(TARGET_PREFIX))
            .context("Failed to write target proteome")?;

        let mut makedb = Command::new(&self.makeblastdb);
        makedb
            .arg("-in")
            .arg(&target_path)
            .arg("-dbtype")
            .arg("prot")
            .arg("-out")
            .arg(&db_path);
        run_checked(makedb, MAKEBLASTDB)?;

        let mut search = Command::new(&self.blastp);
        search
            .arg("-query")
            .arg(&query_path)
            .arg("-db")
            .arg(&db_path)
            .arg("-outfmt")
            .arg("6")
            .arg("-evalue")
            .arg(max_evalue)
            .arg("-num_threads")
            .arg(self.threads.to_string())
            .arg("-out")
            .arg(&output_path);
        run_checked(search, BLASTP)?;

        let file = File::open(&output_path).context("BLAST produced no output file")?;
        Ok(Box::new(TabularHits {
            lines: BufReader::new(file).lines(),
            line_no: 0,
            query_names: query.names().map(str::to_string).collect(),
            target_names: target.names().map(str::to_string).collect(),
            _scratch: scratch,
        }))
    }
}

impl Aligner for BlastAligner {
    fn name(&self) -> &str {
        "blast"
    }

    fn align(&self, query: &Proteome, target: &Proteome, max_evalue: &str) -> Result<HitStream> {
        if query.is_empty() || target.is_empty() {
            debug!("Empty proteome, skipping BLAST");
            return Ok(Box::new(std::iter::empty()));
        }
        self.run_search(query, target, max_evalue)
            .map_err(|e| GenomeCmpError::Alignment(format!("{:#}", e)))
    }

    fn verify_installation(&self) -> Result<()> {
        for binary in [&self.blastp, &self.makeblastdb] {
            if !binary.exists() {
                return Err(GenomeCmpError::Alignment(format!(
                    "BLAST binary not found at {}",
                    binary.display()
                )));
            }
        }
        let version = self
            .check_version()
            .map_err(|e| GenomeCmpError::Alignment(format!("{:#}", e)))?;
        debug!(version = %version, "BLAST available");
        Ok(())
    }
}

fn find_on_path(binary: &str) -> Result<PathBuf> {
    which::which(binary)
        .map_err(|e| GenomeCmpError::Alignment(format!("{} not found on PATH: {}", binary, e)))
}

fn run_checked(mut command: Command, label: &str) -> AnyResult<Output> {
    debug!(command = ?command, "Running {}", label);
    let output = command
        .output()
        .with_context(|| format!("Failed to start {}", label))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("{} failed ({}): {}", label, output.status, stderr.trim());
    }
    Ok(output)
}

/// Lazily parsed `-outfmt 6` output; keeps the scratch directory alive until dropped
struct TabularHits {
    lines: Lines<BufReader<File>>,
    line_no: usize,
    query_names: Vec<String>,
    target_names: Vec<String>,
    _scratch: TempDir,
}

impl Iterator for TabularHits {
    type Item = Result<PairHit>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(GenomeCmpError::Io(e))),
            };
            self.line_no += 1;
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let hit = parse_tabular_line(&line)
                .and_then(|hit| restore_names(hit, &self.query_names, &self.target_names));
            return Some(hit.map_err(|e| {
                GenomeCmpError::Alignment(format!("Line {} of BLAST output: {}", self.line_no, e))
            }));
        }
    }
}

/// Parse one line of BLAST tabular output
pub fn parse_tabular_line(line: &str) -> std::result::Result<PairHit, String> {
    let parts: Vec<&str> = line.split('\t').collect();
    if parts.len() < TABULAR_COLUMNS {
        return Err(format!(
            "expected {} columns, found {}",
            TABULAR_COLUMNS,
            parts.len()
        ));
    }

    fn field<T: std::str::FromStr>(parts: &[&str], idx: usize, name: &str) -> std::result::Result<T, String> {
        parts[idx]
            .trim()
            .parse()
            .map_err(|_| format!("invalid {} {:?}", name, parts[idx]))
    }

    Ok(PairHit {
        id1: parts[0].to_string(),
        id2: parts[1].to_string(),
        identity: field(&parts, 2, "identity")?,
        alignment_length: field(&parts, 3, "alignment length")?,
        mismatches: field(&parts, 4, "mismatches")?,
        gap_opens: field(&parts, 5, "gap opens")?,
        query_start: field(&parts, 6, "query start")?,
        query_end: field(&parts, 7, "query end")?,
        subject_start: field(&parts, 8, "subject start")?,
        subject_end: field(&parts, 9, "subject end")?,
        evalue: parts[10].trim().to_string(),
        bit_score: field(&parts, 11, "bit score")?,
    })
}

/// Replace positional ids (`q<pos>`, `t<pos>`) with the protein names they stand for
fn restore_names(
    mut hit: PairHit,
    query_names: &[String],
    target_names: &[String],
) -> std::result::Result<PairHit, String> {
    hit.id1 = lookup_positional(&hit.id1, QUERY_PREFIX, query_names)?;
    hit.id2 = lookup_positional(&hit.id2, TARGET_PREFIX, target_names)?;
    Ok(hit)
}

fn lookup_positional(id: &str, prefix: &str, names: &[String]) -> std::result::Result<String, String> {
    id.strip_prefix(prefix)
        .and_then(|pos| pos.parse::<usize>().ok())
        .and_then(|pos| names.get(pos))
        .cloned()
        .ok_or_else(|| format!("unexpected sequence id {:?}", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_keeps_evalue_text() {
        let hit = parse_tabular_line("p1\tq7\t87.50\t120\t15\t0\t1\t120\t3\t122\t2e-45\t210.3").unwrap();

        assert_eq!(hit.id1, "p1");
        assert_eq!(hit.id2, "q7");
        assert_eq!(hit.alignment_length, 120);
        assert_eq!(hit.evalue, "2e-45");
        assert_eq!(hit.bit_score, 210.3);
    }

    #[test]
    fn test_parse_rejects_short_lines() {
        assert!(parse_tabular_line("p1\tq7\t87.5").is_err());
    }

    #[test]
    fn test_parse_rejects_bad_numbers() {
        let err = parse_tabular_line("p1\tq7\tx\t120\t15\t0\t1\t120\t3\t122\t1e-5\t10").unwrap_err();
        assert!(err.contains("identity"));
    }

    #[test]
    fn test_empty_proteome_skips_process() {
        let aligner = BlastAligner::new(
            PathBuf::from("/nonexistent/blastp"),
            PathBuf::from("/nonexistent/makeblastdb"),
        );
        let mut query = Proteome::new();
        query.insert("p".to_string(), "MK".to_string());

        let hits: Vec<_> = aligner.align(&query, &Proteome::new(), "1e-10").unwrap().collect();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_missing_binary_is_alignment_error() {
        let aligner = BlastAligner::new(
            PathBuf::from("/nonexistent/blastp"),
            PathBuf::from("/nonexistent/makeblastdb"),
        );
        assert!(matches!(
            aligner.verify_installation(),
            Err(GenomeCmpError::Alignment(_))
        ));

        let mut proteome = Proteome::new();
        proteome.insert("p".to_string(), "MK".to_string());
        let result = aligner.align(&proteome, &proteome, "1e-10");
        assert!(matches!(result, Err(GenomeCmpError::Alignment(_))));
    }

    #[test]
    fn test_tabular_stream_skips_comments() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hits.tsv");
        std::fs::write(
            &path,
            "# BLASTP\nq0\tt1\t90\t10\t1\t0\t1\t10\t1\t10\t1e-20\t50.5\n\nbroken line\n",
        )
        .unwrap();

        let stream = TabularHits {
            lines: BufReader::new(File::open(&path).unwrap()).lines(),
            line_no: 0,
            query_names: vec!["kb|g.0.peg.1".to_string()],
            target_names: vec!["gene 1".to_string(), "gene 2".to_string()],
            _scratch: dir,
        };
        let items: Vec<_> = stream.collect();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap().bit_score, 50.5);
        assert_eq!(items[0].as_ref().unwrap().id1, "kb|g.0.peg.1");
        assert_eq!(items[0].as_ref().unwrap().id2, "gene 2");
        assert!(matches!(items[1], Err(GenomeCmpError::Alignment(_))));
    }

    #[test]
    fn test_positional_ids_map_back_to_names() {
        let query = vec!["gene 1".to_string(), "kb|g.0.peg.1".to_string()];
        let target = vec!["kb|g.1.peg.7 putative kinase".to_string()];
        let hit = parse_tabular_line("q1\tt0\t87.50\t120\t15\t0\t1\t120\t3\t122\t2e-45\t210.3").unwrap();

        let hit = restore_names(hit, &query, &target).unwrap();

        assert_eq!(hit.id1, "kb|g.0.peg.1");
        assert_eq!(hit.id2, "kb|g.1.peg.7 putative kinase");
        assert_eq!(hit.bit_score, 210.3);
    }

    #[test]
    fn test_unknown_positional_id_rejected() {
        let names = vec!["gene 1".to_string()];
        let hit = PairHit::scored("q5", "t0", 10.0);
        assert!(restore_names(hit, &names, &names).unwrap_err().contains("q5"));

        let hit = PairHit::scored("gene", "t0", 10.0);
        assert!(restore_names(hit, &names, &names).is_err());
    }
}
