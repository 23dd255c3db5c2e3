//! Scripted mock reader.
//!
//! A [`MockReader`] answers each `poll_tag` with the next [`PollStep`] from
//! its script. When the script runs out it keeps answering with its resting
//! state, which the [`MockReaderHandle`] can change at any time (present a
//! tag, take it away, inject faults).
//!
//! Tags carry a memory image laid out like an NTAG2xx: header pages 0-3 with
//! the capability container on page 3, user memory from page 4. A tag can be
//! marked unreadable for its first polls, which is what a real tag looks like
//! while it is still entering the field.

use std::collections::VecDeque;
use std::time::Duration;

use serde::Deserialize;
use tagbridge_core::{TagUid, constants::BLOCK_SIZE};
use tokio::sync::mpsc;
use tracing::trace;

use super::MockBus;
use crate::{
    Block, FirmwareInfo, HardwareError, Result,
    traits::TagReader,
};

/// Capability container for a 144-byte NDEF data area.
const CAPABILITY_CONTAINER: Block = [0xE1, 0x10, 0x12, 0x00];

/// First user page of an NTAG2xx.
const USER_PAGE: usize = 4;

/// A tag that can be placed on a mock reader.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "TagScript")]
pub struct MockTag {
    uid: TagUid,
    memory: Vec<u8>,
    locked_polls: u32,
    read_delay: Duration,
}

impl MockTag {
    /// Tag with a raw memory image starting at page 0.
    pub fn new(uid: TagUid, memory: Vec<u8>) -> Self {
        Self {
            uid,
            memory,
            locked_polls: 0,
            read_delay: Duration::ZERO,
        }
    }

    /// Tag whose user memory holds one NDEF text record.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagbridge_core::TagUid;
    /// use tagbridge_hardware::mock::MockTag;
    ///
    /// let tag = MockTag::with_text(TagUid::from_hex("04A3B2C1").unwrap(), "Goblin");
    /// assert_eq!(&tag.memory()[16..18], &[0x03, 13]);
    /// ```
    pub fn with_text(uid: TagUid, text: &str) -> Self {
        let mut memory = header_pages(&uid);
        memory.extend(text_record_tlv(text));
        Self::new(uid, memory)
    }

    /// Tag with no readable content (blank user memory).
    pub fn blank(uid: TagUid) -> Self {
        let memory = header_pages(&uid);
        Self::new(uid, memory)
    }

    /// Keep memory unreadable for the first `polls` polls of a presence.
    pub fn locked_for(mut self, polls: u32) -> Self {
        self.locked_polls = polls;
        self
    }

    /// Delay every block read by `delay`.
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = delay;
        self
    }

    pub fn uid(&self) -> &TagUid {
        &self.uid
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    fn block(&self, index: u8) -> Block {
        let start = index as usize * BLOCK_SIZE;
        let mut block = [0u8; BLOCK_SIZE];
        if let Some(bytes) = self.memory.get(start..) {
            let n = bytes.len().min(BLOCK_SIZE);
            block[..n].copy_from_slice(&bytes[..n]);
        }
        block
    }
}

/// Serialized form of a [`MockTag`] in scenario files.
///
/// Content is either `text` (an NDEF text record is generated) or a hex
/// `memory` image; with neither the tag is blank.
#[derive(Debug, Deserialize)]
struct TagScript {
    uid: TagUid,
    #[serde(default)]
    text: Option<String>,
    #[serde(default, with = "hex::serde")]
    memory: Vec<u8>,
    #[serde(default)]
    locked_polls: u32,
    #[serde(default)]
    read_delay_ms: u64,
}

impl From<TagScript> for MockTag {
    fn from(script: TagScript) -> Self {
        let tag = match script.text {
            Some(text) => MockTag::with_text(script.uid, &text),
            None if script.memory.is_empty() => MockTag::blank(script.uid),
            None => MockTag::new(script.uid, script.memory),
        };
        tag.locked_for(script.locked_polls)
            .with_read_delay(Duration::from_millis(script.read_delay_ms))
    }
}

/// What the reader answers to one poll.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PollStep {
    /// Empty field.
    Empty,
    /// A tag in the field.
    Tag(MockTag),
    /// Bus fault (missing ACK).
    Fault,
    /// The reader reports a poll timeout.
    Timeout,
    /// The reader never answers.
    Stall,
}

/// Handle commands, applied by the reader before its next transaction.
#[derive(Debug)]
enum ReaderCommand {
    Rest(PollStep),
    Queue(PollStep),
    FailProbe(bool),
}

/// Tag selected by the last poll.
#[derive(Debug)]
struct Selected {
    tag: MockTag,
    locked_remaining: u32,
    readable: bool,
}

/// Scripted reader for simulation and testing.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tagbridge_core::TagUid;
/// use tagbridge_hardware::mock::{MockReader, MockTag, PollStep};
/// use tagbridge_hardware::traits::TagReader;
///
/// #[tokio::main]
/// async fn main() -> tagbridge_hardware::Result<()> {
///     let uid = TagUid::from_hex("04A3B2C1").unwrap();
///     let mut reader = MockReader::scripted(
///         "Slot 1",
///         vec![PollStep::Empty, PollStep::Tag(MockTag::with_text(uid.clone(), "Cat"))],
///     );
///
///     let timeout = Duration::from_millis(50);
///     assert_eq!(reader.poll_tag(timeout).await?, None);
///     assert_eq!(reader.poll_tag(timeout).await?, Some(uid));
///     assert_eq!(reader.poll_tag(timeout).await?, None);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockReader {
    name: String,
    command_rx: mpsc::Receiver<ReaderCommand>,
    // Keeps the channel open for scripted readers that have no handle
    _command_tx: Option<mpsc::Sender<ReaderCommand>>,
    script: VecDeque<PollStep>,
    resting: PollStep,
    selected: Option<Selected>,
    firmware: FirmwareInfo,
    probe_fails: bool,
    polls: u64,
    bus: Option<MockBus>,
}

impl MockReader {
    /// Create a mock reader with the default name and an empty field.
    ///
    /// Returns the reader and a handle that controls it.
    pub fn new() -> (Self, MockReaderHandle) {
        Self::with_name("Mock Reader")
    }

    /// Create a mock reader with a custom name.
    pub fn with_name(name: impl Into<String>) -> (Self, MockReaderHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let reader = Self::build(name.into(), command_rx, None);
        (reader, MockReaderHandle { command_tx })
    }

    /// Create a reader that answers polls from `steps`, then with an empty
    /// field.
    pub fn scripted(name: impl Into<String>, steps: impl IntoIterator<Item = PollStep>) -> Self {
        let (command_tx, command_rx) = mpsc::channel(1);
        let mut reader = Self::build(name.into(), command_rx, Some(command_tx));
        reader.script.extend(steps);
        reader
    }

    fn build(
        name: String,
        command_rx: mpsc::Receiver<ReaderCommand>,
        command_tx: Option<mpsc::Sender<ReaderCommand>>,
    ) -> Self {
        Self {
            name,
            command_rx,
            _command_tx: command_tx,
            script: VecDeque::new(),
            resting: PollStep::Empty,
            selected: None,
            firmware: FirmwareInfo::default(),
            probe_fails: false,
            polls: 0,
            bus: None,
        }
    }

    /// Make the firmware probe fail, as an unwired reader would.
    pub fn with_failing_probe(mut self) -> Self {
        self.probe_fails = true;
        self
    }

    /// Record every probe, poll and block read on `bus`.
    pub fn on_bus(mut self, bus: MockBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Number of polls answered so far.
    pub fn poll_count(&self) -> u64 {
        self.polls
    }

    /// Steps left in the script.
    pub fn remaining_steps(&self) -> usize {
        self.script.len()
    }

    fn apply_commands(&mut self) {
        while let Ok(command) = self.command_rx.try_recv() {
            match command {
                ReaderCommand::Rest(step) => self.resting = step,
                ReaderCommand::Queue(step) => self.script.push_back(step),
                ReaderCommand::FailProbe(fails) => self.probe_fails = fails,
            }
        }
    }

    fn select(&mut self, tag: MockTag) -> TagUid {
        let uid = tag.uid.clone();
        let mut selected = match self.selected.take() {
            Some(current) if current.tag.uid == uid => current,
            _ => Selected {
                locked_remaining: tag.locked_polls,
                tag,
                readable: false,
            },
        };
        selected.readable = selected.locked_remaining == 0;
        selected.locked_remaining = selected.locked_remaining.saturating_sub(1);
        self.selected = Some(selected);
        uid
    }
}

impl TagReader for MockReader {
    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(&mut self) -> Result<FirmwareInfo> {
        let _transaction = self.bus.as_ref().map(MockBus::begin);
        self.apply_commands();
        if self.probe_fails {
            return Err(HardwareError::probe_failed(format!(
                "{}: no answer to firmware query",
                self.name
            )));
        }
        Ok(self.firmware)
    }

    async fn poll_tag(&mut self, timeout: Duration) -> Result<Option<TagUid>> {
        let _transaction = self.bus.as_ref().map(MockBus::begin);
        self.apply_commands();
        self.polls += 1;

        let step = self
            .script
            .pop_front()
            .unwrap_or_else(|| self.resting.clone());
        trace!(reader = %self.name, ?step, "mock poll");

        match step {
            PollStep::Empty => {
                self.selected = None;
                Ok(None)
            }
            PollStep::Tag(tag) => Ok(Some(self.select(tag))),
            PollStep::Fault => {
                self.selected = None;
                Err(HardwareError::bus(format!(
                    "{}: no ACK from reader",
                    self.name
                )))
            }
            PollStep::Timeout => {
                self.selected = None;
                Err(HardwareError::timeout(
                    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                ))
            }
            PollStep::Stall => std::future::pending().await,
        }
    }

    async fn read_block(&mut self, index: u8) -> Result<Option<Block>> {
        let _transaction = self.bus.as_ref().map(MockBus::begin);
        self.apply_commands();

        let selected = self
            .selected
            .as_ref()
            .ok_or_else(|| HardwareError::tag_read(format!("{}: no tag selected", self.name)))?;
        if !selected.readable {
            return Ok(None);
        }

        let delay = selected.tag.read_delay;
        let block = selected.tag.block(index);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(Some(block))
    }
}

/// Handle for controlling a [`MockReader`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tagbridge_core::TagUid;
/// use tagbridge_hardware::mock::{MockReader, MockTag};
/// use tagbridge_hardware::traits::TagReader;
///
/// #[tokio::main]
/// async fn main() -> tagbridge_hardware::Result<()> {
///     let (mut reader, handle) = MockReader::new();
///     let uid = TagUid::from_hex("04A3B2C1").unwrap();
///
///     handle.present(MockTag::with_text(uid.clone(), "Cat")).await?;
///     assert_eq!(reader.poll_tag(Duration::from_millis(50)).await?, Some(uid));
///
///     handle.remove().await?;
///     assert_eq!(reader.poll_tag(Duration::from_millis(50)).await?, None);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockReaderHandle {
    command_tx: mpsc::Sender<ReaderCommand>,
}

impl MockReaderHandle {
    /// Leave `tag` on the reader until told otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn present(&self, tag: MockTag) -> Result<()> {
        self.send(ReaderCommand::Rest(PollStep::Tag(tag))).await
    }

    /// Take the tag away.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn remove(&self) -> Result<()> {
        self.send(ReaderCommand::Rest(PollStep::Empty)).await
    }

    /// Answer every poll from now on with `step`.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn rest_on(&self, step: PollStep) -> Result<()> {
        self.send(ReaderCommand::Rest(step)).await
    }

    /// Answer the next unscripted poll with `step`, then fall back to the
    /// resting state.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn queue(&self, step: PollStep) -> Result<()> {
        self.send(ReaderCommand::Queue(step)).await
    }

    /// Make the firmware probe fail or succeed.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn fail_probe(&self, fails: bool) -> Result<()> {
        self.send(ReaderCommand::FailProbe(fails)).await
    }

    async fn send(&self, command: ReaderCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| HardwareError::gone("mock reader dropped"))
    }
}

fn header_pages(uid: &TagUid) -> Vec<u8> {
    let mut pages = vec![0u8; USER_PAGE * BLOCK_SIZE];
    let n = uid.len().min(3 * BLOCK_SIZE);
    pages[..n].copy_from_slice(&uid.as_bytes()[..n]);
    pages[3 * BLOCK_SIZE..].copy_from_slice(&CAPABILITY_CONTAINER);
    pages
}

/// NDEF message TLV holding one well-known text record (language "en").
fn text_record_tlv(text: &str) -> Vec<u8> {
    let body: Vec<u8> = text.chars().map(|c| u8::try_from(c).unwrap_or(b'?')).collect();

    let mut payload = vec![0x02, b'e', b'n'];
    payload.extend(body);

    let mut record = Vec::with_capacity(payload.len() + 7);
    if let Ok(short_len) = u8::try_from(payload.len()) {
        // MB | ME | SR, TNF well-known
        record.extend([0xD1, 0x01, short_len]);
    } else {
        record.extend([0xC1, 0x01]);
        record.extend((payload.len() as u32).to_be_bytes());
    }
    record.push(b'T');
    record.extend(payload);

    let mut tlv = vec![0x03];
    match u8::try_from(record.len()) {
        Ok(len) if len < 0xFF => tlv.push(len),
        _ => {
            tlv.push(0xFF);
            tlv.extend((record.len() as u16).to_be_bytes());
        }
    }
    tlv.extend(record);
    tlv.push(0xFE);
    tlv
}
