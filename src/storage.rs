use chrono::Local;
use std::env;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

/// `$XDG_DATA_HOME/segsieve`, falling back to `~/.local/share/segsieve`.
pub fn data_dir() -> io::Result<PathBuf> {
    let xdg_data_home = env::var("XDG_DATA_HOME")
        .ok()
        .and_then(|path| {
            if path.is_empty() {
                None
            } else {
                Some(PathBuf::from(path))
            }
        })
        .or_else(|| {
            env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(".local/share"))
        })
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "could not determine data directory"))?;

    Ok(xdg_data_home.join("segsieve"))
}

/// Creates (truncating) `name` inside the data directory.
pub fn create_data_file(name: &str) -> io::Result<(PathBuf, File)> {
    let dir = data_dir()?;
    fs::create_dir_all(&dir)?;
    let path = dir.join(name);
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&path)?;
    Ok((path, file))
}

/// Appends one line per run to `execution_log.txt`.
pub fn log_execution(subcommand: &str, args: &str, threads: usize, duration_us: u128) -> io::Result<()> {
    let dir = data_dir()?;
    fs::create_dir_all(&dir)?;

    let log_path = dir.join("execution_log.txt");
    let mut file = OpenOptions::new().create(true).append(true).open(log_path)?;

    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");

    writeln!(
        file,
        "{} | {} | {} | t{} | {}us",
        timestamp, subcommand, args, threads, duration_us
    )?;

    Ok(())
}

/// Buffered decimal output of primes and tuplets, one per line.
///
/// The sieve reports values through callbacks that cannot fail, so the
/// first write error is kept and returned by [`PrimeWriter::finish`];
/// later values are dropped.
pub struct PrimeWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
    written: u64,
    error: Option<io::Error>,
}

impl<W: Write> PrimeWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(256 * 1024, inner),
            itoa_buf: itoa::Buffer::new(),
            written: 0,
            error: None,
        }
    }

    fn record(&mut self, result: io::Result<()>) {
        match result {
            Ok(()) => self.written += 1,
            Err(e) => self.error = Some(e),
        }
    }

    pub fn write_prime(&mut self, prime: u64) {
        if self.error.is_some() {
            return;
        }
        let result = self
            .writer
            .write_all(self.itoa_buf.format(prime).as_bytes())
            .and_then(|()| self.writer.write_all(b"\n"));
        self.record(result);
    }

    /// Writes `(a, b, c)`.
    pub fn write_tuplet(&mut self, members: &[u64]) {
        if self.error.is_some() {
            return;
        }
        let mut line = Vec::with_capacity(members.len() * 22 + 2);
        line.push(b'(');
        for (i, &member) in members.iter().enumerate() {
            if i > 0 {
                line.extend_from_slice(b", ");
            }
            line.extend_from_slice(self.itoa_buf.format(member).as_bytes());
        }
        line.extend_from_slice(b")\n");
        let result = self.writer.write_all(&line);
        self.record(result);
    }

    /// Flushes and returns the number of lines written.
    pub fn finish(mut self) -> io::Result<u64> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.writer.flush()?;
        Ok(self.written)
    }
}
