//! MDA log sink: one CSV line per tick of sensed inputs and commanded
//! outputs.

use std::io::{self, Write};

use mcis_common::Vector3;

/// One tick's worth of logged fields, in wire order:
/// `ax,ay,az,p,q,r,phi,theta,psi,posX,posY,posZ,rotR,rotP,rotY`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogRow {
    pub specific_force: Vector3,
    pub angular_rate: Vector3,
    pub attitude: Vector3,
    pub pos: Vector3,
    pub rot: Vector3,
}

impl LogRow {
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}\n",
            self.specific_force.x,
            self.specific_force.y,
            self.specific_force.z,
            self.angular_rate.x,
            self.angular_rate.y,
            self.angular_rate.z,
            self.attitude.x,
            self.attitude.y,
            self.attitude.z,
            self.pos.x,
            self.pos.y,
            self.pos.z,
            self.rot.x,
            self.rot.y,
            self.rot.z,
        )
    }
}

/// A buffered CSV writer for [`LogRow`]s. Each row is flushed immediately
/// so a crash doesn't lose the final ticks before it.
pub struct MdaLog<W: Write> {
    writer: io::BufWriter<W>,
}

impl MdaLog<std::fs::File> {
    pub fn create(path: &std::path::Path) -> io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(MdaLog { writer: io::BufWriter::new(file) })
    }
}

impl<W: Write> MdaLog<W> {
    pub fn append(&mut self, row: &LogRow) -> io::Result<()> {
        self.writer.write_all(row.to_csv_line().as_bytes())?;
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_line_has_fifteen_comma_separated_fields() {
        let row = LogRow {
            specific_force: Vector3::new(1.0, 2.0, 3.0),
            angular_rate: Vector3::new(4.0, 5.0, 6.0),
            attitude: Vector3::new(7.0, 8.0, 9.0),
            pos: Vector3::new(10.0, 11.0, 12.0),
            rot: Vector3::new(13.0, 14.0, 15.0),
        };
        let line = row.to_csv_line();
        assert!(line.ends_with('\n'));
        assert_eq!(line.trim_end().split(',').count(), 15);
    }

    #[test]
    fn append_writes_one_line_per_row() {
        let buf: Vec<u8> = Vec::new();
        let mut log = MdaLog { writer: io::BufWriter::new(buf) };
        let row = LogRow {
            specific_force: Vector3::ZERO,
            angular_rate: Vector3::ZERO,
            attitude: Vector3::ZERO,
            pos: Vector3::ZERO,
            rot: Vector3::ZERO,
        };
        log.append(&row).unwrap();
        log.append(&row).unwrap();
        let contents = String::from_utf8(log.writer.into_inner().unwrap()).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn create_writes_to_a_real_file_path() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("mcis.log.csv");
        let row = LogRow {
            specific_force: Vector3::new(1.0, 0.0, 0.0),
            angular_rate: Vector3::ZERO,
            attitude: Vector3::ZERO,
            pos: Vector3::new(0.1, 0.2, 0.3),
            rot: Vector3::ZERO,
        };

        let mut log = MdaLog::create(&path).expect("create log file");
        log.append(&row).unwrap();
        log.append(&row).unwrap();
        drop(log);

        let contents = std::fs::read_to_string(&path).expect("read back log file");
        assert_eq!(contents.lines().count(), 2);
        assert_eq!(contents.lines().next().unwrap(), row.to_csv_line().trim_end());
    }
}
