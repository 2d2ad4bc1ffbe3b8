//! Console output for received payloads.

use std::io::{self, Write};

/// Where decoded client payloads are printed.
pub struct Console {
    out: Box<dyn Write + Send>,
}

impl Console {
    /// Print to the process's stdout.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self { out: Box::new(out) }
    }

    /// Decode a chunk as text (invalid UTF-8 is replaced) and print it on its own line.
    pub fn print_payload(&mut self, bytes: &[u8]) -> io::Result<()> {
        let text = String::from_utf8_lossy(bytes);
        writeln!(self.out, "{text}")?;
        self.out.flush()
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::stdout()
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn prints_text_line() {
        let capture = Capture::default();
        let mut console = Console::new(capture.clone());
        console.print_payload(b"hi").unwrap();
        assert_eq!(&*capture.0.lock().unwrap(), b"hi\n");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let capture = Capture::default();
        let mut console = Console::new(capture.clone());
        console.print_payload(&[0xff, b'o', b'k']).unwrap();
        let printed = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        assert_eq!(printed, "\u{FFFD}ok\n");
    }
}
