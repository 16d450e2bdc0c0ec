use crate::bio::sequence::Proteome;
use crate::GenomeCmpError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Residues per line in written FASTA files
const LINE_WIDTH: usize = 60;

/// How each record's defline is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deflines<'a> {
    /// The protein name as-is
    Names,
    /// `<prefix><position>`, safe for tools that reparse deflines
    Positional(&'a str),
}

impl Deflines<'_> {
    fn render(&self, position: usize, name: &str) -> String {
        match self {
            Deflines::Names => name.to_string(),
            Deflines::Positional(prefix) => format!("{}{}", prefix, position),
        }
    }
}

/// Write a proteome to a FASTA file, one record per protein in position order
pub fn write_proteome<P: AsRef<Path>>(
    path: P,
    proteome: &Proteome,
    deflines: Deflines<'_>,
) -> Result<(), GenomeCmpError> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write_proteome_to_writer(&mut writer, proteome, deflines)?;
    writer.flush()?;
    Ok(())
}

/// Write a proteome to any writer
pub fn write_proteome_to_writer<W: Write>(
    writer: &mut W,
    proteome: &Proteome,
    deflines: Deflines<'_>,
) -> Result<(), GenomeCmpError> {
    for (position, (name, sequence)) in proteome.iter().enumerate() {
        writeln!(writer, ">{}", deflines.render(position, name))?;

        for chunk in sequence.as_bytes().chunks(LINE_WIDTH) {
            writer.write_all(chunk)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_wraps_long_sequences() {
        let mut proteome = Proteome::new();
        proteome.insert("p1".to_string(), "M".repeat(130));
        proteome.insert("p2".to_string(), "MKV".to_string());

        let mut out = Vec::new();
        write_proteome_to_writer(&mut out, &proteome, Deflines::Names).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], ">p1");
        assert_eq!(lines[1].len(), 60);
        assert_eq!(lines[2].len(), 60);
        assert_eq!(lines[3].len(), 10);
        assert_eq!(lines[4], ">p2");
        assert_eq!(lines[5], "MKV");
    }

    #[test]
    fn test_positional_deflines_hide_names() {
        let mut proteome = Proteome::new();
        proteome.insert("kb|g.0.peg.1".to_string(), "MA".to_string());
        proteome.insert("gene 2".to_string(), "MK".to_string());

        let mut out = Vec::new();
        write_proteome_to_writer(&mut out, &proteome, Deflines::Positional("q")).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), ">q0\nMA\n>q1\nMK\n");
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proteins.faa");
        let mut proteome = Proteome::new();
        proteome.insert("a".to_string(), "MA".to_string());

        write_proteome(&path, &proteome, Deflines::Names).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), ">a\nMA\n");
    }
}
