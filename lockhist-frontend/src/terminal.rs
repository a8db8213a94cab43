use std::io::{stderr, BufWriter, Stderr};

use crossterm::{
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Frame, Terminal};

use crate::error::AppError;

#[derive(Default)]
pub struct TerminalWrapper {
    inner: Option<Terminal<CrosstermBackend<BufWriter<Stderr>>>>,
}

impl TerminalWrapper {
    pub fn start() -> Result<Self, AppError> {
        stderr().execute(EnterAlternateScreen)?;
        terminal::enable_raw_mode()?;

        let mut terminal = Terminal::new(CrosstermBackend::new(BufWriter::new(stderr())))?;
        terminal.clear()?;

        Ok(Self {
            inner: Some(terminal),
        })
    }

    pub fn shutdown(&mut self) -> Result<(), AppError> {
        if self.inner.take().is_some() {
            terminal::disable_raw_mode()?;
            stderr().execute(LeaveAlternateScreen)?;
        }

        Ok(())
    }

    pub fn size(&self) -> Result<Rect, AppError> {
        match &self.inner {
            Some(term) => {
                let size = term.size()?;
                Ok(Rect::new(0, 0, size.width, size.height))
            }
            None => Err(AppError::TerminalNotInitialized),
        }
    }

    pub fn draw(&mut self, view: impl FnOnce(&mut Frame<'_>)) -> Result<(), AppError> {
        if let Some(term) = &mut self.inner {
            term.draw(view)?;
        }

        Ok(())
    }
}

impl Drop for TerminalWrapper {
    fn drop(&mut self) {
        if let Err(error) = self.shutdown() {
            tracing::error!("restoring terminal failed: {:?}", error);
        }
    }
}
