//! Audible threat alarm through the terminal bell.
//!
//! On the Linux virtual console the bell pitch and length are programmable
//! (`ESC [10;hz]`, `ESC [11;ms]`); elsewhere only the plain BEL is sent and
//! the duration is honoured by blocking.

use std::io::{self, Stdout, Write};
use std::time::Duration;
use warden_core::Alarm;

const BEL: &[u8] = b"\x07";

pub struct Bell<W: Write> {
    out: W,
    frequency_hz: u32,
    duration: Duration,
    program_console: bool,
}

impl Bell<Stdout> {
    /// Bell on the process's terminal.
    pub fn terminal(frequency_hz: u32, duration: Duration) -> Self {
        let program_console = std::env::var("TERM").is_ok_and(|t| t == "linux");
        Self::new(io::stdout(), frequency_hz, duration, program_console)
    }
}

impl<W: Write> Bell<W> {
    pub fn new(out: W, frequency_hz: u32, duration: Duration, program_console: bool) -> Self {
        Self {
            out,
            frequency_hz,
            duration,
            program_console,
        }
    }

    fn ring(&mut self) -> io::Result<()> {
        if self.program_console {
            write!(
                self.out,
                "\x1b[10;{}]\x1b[11;{}]",
                self.frequency_hz,
                self.duration.as_millis()
            )?;
        }
        self.out.write_all(BEL)?;
        self.out.flush()
    }
}

impl<W: Write> Alarm for Bell<W> {
    fn sound(&mut self) {
        if let Err(e) = self.ring() {
            tracing::warn!(error = %e, "failed to ring alarm bell");
        }
        std::thread::sleep(self.duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_plain_bell() {
        let mut bell = Bell::new(Vec::new(), 1000, Duration::ZERO, false);
        bell.sound();
        bell.sound();
        assert_eq!(bell.out, b"\x07\x07");
    }

    #[test]
    fn test_console_bell_programs_pitch() {
        let mut bell = Bell::new(Vec::new(), 1000, Duration::from_millis(5), true);
        bell.sound();
        assert_eq!(bell.out, b"\x1b[10;1000]\x1b[11;5]\x07");
    }

    #[test]
    fn test_sound_blocks_for_duration() {
        let mut bell = Bell::new(io::sink(), 1000, Duration::from_millis(30), false);
        let start = Instant::now();
        bell.sound();
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_is_not_fatal() {
        let mut bell = Bell::new(Broken, 1000, Duration::ZERO, false);
        bell.sound();
    }
}
