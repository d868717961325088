use crate::domain::apdu::{Command, Response};
use crate::domain::ports::{CardConnection, CardReader};
use crate::error::ReaderError;
use pcsc::{Card, Context, Disposition, Protocols, Scope, ShareMode};
use std::ffi::CString;
use tracing::{debug, info};

/// A PC/SC reader selected by name.
pub struct PcscReader {
    context: Context,
    reader: CString,
    name: String,
}

impl PcscReader {
    /// Establishes a PC/SC context and selects the first reader whose name
    /// contains one of `families`.
    pub fn open(families: &[String]) -> Result<Self, ReaderError> {
        let context = Context::establish(Scope::User).map_err(map_error)?;
        let readers = match context.list_readers_owned() {
            Ok(readers) => readers,
            Err(pcsc::Error::NoReadersAvailable) => Vec::new(),
            Err(e) => return Err(map_error(e)),
        };
        let names: Vec<String> = readers
            .iter()
            .map(|r| r.to_string_lossy().into_owned())
            .collect();
        info!(readers = ?names, "Available readers");

        let index = select_reader(&names, families)?;
        Ok(Self {
            context,
            reader: readers[index].clone(),
            name: names[index].clone(),
        })
    }
}

/// Index of the first reader, in list order, whose name contains one of
/// `families`.
fn select_reader(names: &[String], families: &[String]) -> Result<usize, ReaderError> {
    if names.is_empty() {
        return Err(ReaderError::NoReaderFound);
    }
    names
        .iter()
        .position(|name| families.iter().any(|family| name.contains(family.as_str())))
        .ok_or_else(|| ReaderError::NoCompatibleReaderFound {
            available: names.to_vec(),
        })
}

impl CardReader for PcscReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn connect(&mut self) -> Result<Box<dyn CardConnection>, ReaderError> {
        let card = self
            .context
            .connect(&self.reader, ShareMode::Shared, Protocols::ANY)
            .map_err(map_error)?;
        Ok(Box::new(PcscConnection { card }))
    }
}

struct PcscConnection {
    card: Card,
}

impl CardConnection for PcscConnection {
    fn transmit(&mut self, command: &Command) -> Result<Response, ReaderError> {
        let mut buffer = [0u8; pcsc::MAX_BUFFER_SIZE];
        let raw = self
            .card
            .transmit(command.bytes(), &mut buffer)
            .map_err(map_error)?;
        Response::from_raw(raw)
    }

    fn close(self: Box<Self>) -> Result<(), ReaderError> {
        self.card
            .disconnect(Disposition::LeaveCard)
            .map_err(|(_card, e)| {
                debug!(error = %e, "Card disconnect failed");
                map_error(e)
            })
    }
}

fn map_error(e: pcsc::Error) -> ReaderError {
    match e {
        pcsc::Error::NoSmartcard | pcsc::Error::RemovedCard => ReaderError::NoCardPresent,
        pcsc::Error::NoReadersAvailable | pcsc::Error::UnknownReader => ReaderError::NoReaderFound,
        other => ReaderError::Connection(other.to_string()),
    }
}
