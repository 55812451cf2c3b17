//! Record scanner
//!
//! Walks an export document one XML event at a time. Only a stack of open
//! elements is held in memory: `Record` and `Workout` attributes are captured when
//! their start tag is read and handed to a [`NodeHandler`] when the element
//! closes. Everything else is counted and dropped.

use crate::error::DigestError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use std::io::BufRead;

const RECORD_TAG: &[u8] = b"Record";
const WORKOUT_TAG: &[u8] = b"Workout";

/// Attributes of a measurement `Record` node
///
/// Every field is optional: presence and numeric validity are judged by the
/// handler, not the scanner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordNode {
    /// `type` attribute (e.g. `HKQuantityTypeIdentifierStepCount`)
    pub record_type: Option<String>,
    /// `value` attribute, still string-encoded
    pub value: Option<String>,
    /// `startDate` attribute
    pub start_date: Option<String>,
}

/// Attributes of a `Workout` node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkoutNode {
    /// `workoutActivityType` attribute
    pub activity_type: Option<String>,
    /// `duration` attribute (seconds)
    pub duration: Option<String>,
    /// `totalDistance` attribute (meters)
    pub total_distance: Option<String>,
    /// `totalEnergyBurned` attribute
    pub total_energy_burned: Option<String>,
    /// `startDate` attribute
    pub start_date: Option<String>,
}

/// Receiver for recognized nodes
pub trait NodeHandler {
    /// Called when a `Record` element closes
    fn on_record(&mut self, node: &RecordNode);

    /// Called when a `Workout` element closes
    fn on_workout(&mut self, node: &WorkoutNode);
}

/// Totals observed while scanning
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Closed elements of any kind
    pub nodes_processed: u64,
    /// `Record` elements dispatched
    pub records_seen: u64,
    /// `Workout` elements dispatched
    pub workouts_seen: u64,
}

/// An element that is open while its children are read
enum OpenNode {
    Record(RecordNode),
    Workout(WorkoutNode),
    Other,
}

/// Streaming scanner over an export document
pub struct ExportScanner<R: BufRead> {
    reader: Reader<R>,
    progress_interval: u64,
}

impl<R: BufRead> ExportScanner<R> {
    /// Create a scanner that reports progress every `progress_interval` nodes
    pub fn new(input: R, progress_interval: u64) -> Self {
        Self {
            reader: Reader::from_reader(input),
            progress_interval,
        }
    }

    /// Scan the whole document, dispatching every `Record` and `Workout`
    ///
    /// Fails on malformed markup, read errors, or a document that is not a single
    /// complete root element. Nodes already dispatched stay dispatched; the caller
    /// is expected to discard its state on error.
    pub fn scan<H: NodeHandler>(
        &mut self,
        handler: &mut H,
    ) -> Result<ScanReport, DigestError> {
        let mut report = ScanReport::default();
        let mut open: Vec<OpenNode> = Vec::new();
        let mut root_closed = false;
        let mut buf = Vec::new();

        loop {
            let event = self
                .reader
                .read_event_into(&mut buf)
                .map_err(|source| self.xml_error(source))?;

            match event {
                Event::Start(element) => {
                    self.check_single_root(open.is_empty(), root_closed)?;
                    let node = self.open_node(&element)?;
                    open.push(node);
                }
                Event::Empty(element) => {
                    self.check_single_root(open.is_empty(), root_closed)?;
                    let node = self.open_node(&element)?;
                    root_closed |= open.is_empty();
                    self.close_node(node, handler, &mut report);
                }
                Event::End(_) => {
                    let node = open.pop().ok_or_else(|| {
                        DigestError::StructureError(
                            "closing tag without open element".to_string(),
                        )
                    })?;
                    root_closed |= open.is_empty();
                    self.close_node(node, handler, &mut report);
                }
                Event::Text(text) => {
                    if open.is_empty() {
                        if !text.iter().all(u8::is_ascii_whitespace) {
                            return Err(DigestError::StructureError(format!(
                                "text outside the document element at byte {}",
                                self.reader.buffer_position()
                            )));
                        }
                    } else {
                        // Unknown entity references are malformed markup
                        text.unescape().map_err(|source| self.xml_error(source))?;
                    }
                }
                Event::CData(_) if open.is_empty() => {
                    return Err(DigestError::StructureError(format!(
                        "CDATA outside the document element at byte {}",
                        self.reader.buffer_position()
                    )));
                }
                Event::Eof => break,
                _ => {}
            }

            buf.clear();
        }

        if !open.is_empty() {
            return Err(DigestError::StructureError(format!(
                "document ended with {} unclosed element(s)",
                open.len()
            )));
        }
        if !root_closed {
            return Err(DigestError::StructureError("no root element found".to_string()));
        }

        tracing::info!(
            nodes = report.nodes_processed,
            "Finished processing {} total records",
            report.nodes_processed
        );
        Ok(report)
    }

    fn check_single_root(
        &self,
        at_top_level: bool,
        root_closed: bool,
    ) -> Result<(), DigestError> {
        if at_top_level && root_closed {
            return Err(DigestError::StructureError(format!(
                "junk after document element at byte {}",
                self.reader.buffer_position()
            )));
        }
        Ok(())
    }

    fn open_node(&self, element: &BytesStart<'_>) -> Result<OpenNode, DigestError> {
        match element.name().as_ref() {
            RECORD_TAG => {
                let mut node = RecordNode::default();
                for (key, value) in self.attributes(element)? {
                    match key.as_slice() {
                        b"type" => node.record_type = Some(value),
                        b"value" => node.value = Some(value),
                        b"startDate" => node.start_date = Some(value),
                        _ => {}
                    }
                }
                Ok(OpenNode::Record(node))
            }
            WORKOUT_TAG => {
                let mut node = WorkoutNode::default();
                for (key, value) in self.attributes(element)? {
                    match key.as_slice() {
                        b"workoutActivityType" => node.activity_type = Some(value),
                        b"duration" => node.duration = Some(value),
                        b"totalDistance" => node.total_distance = Some(value),
                        b"totalEnergyBurned" => node.total_energy_burned = Some(value),
                        b"startDate" => node.start_date = Some(value),
                        _ => {}
                    }
                }
                Ok(OpenNode::Workout(node))
            }
            _ => Ok(OpenNode::Other),
        }
    }

    /// Unescaped attributes of an element; a malformed attribute is a document error
    fn attributes(
        &self,
        element: &BytesStart<'_>,
    ) -> Result<Vec<(Vec<u8>, String)>, DigestError> {
        let mut attributes = Vec::new();
        for attribute in element.attributes() {
            let attribute = attribute.map_err(|e| self.xml_error(e.into()))?;
            let value = attribute
                .unescape_value()
                .map_err(|source| self.xml_error(source))?;
            attributes.push((attribute.key.as_ref().to_vec(), value.into_owned()));
        }
        Ok(attributes)
    }

    fn close_node<H: NodeHandler>(
        &self,
        node: OpenNode,
        handler: &mut H,
        report: &mut ScanReport,
    ) {
        report.nodes_processed += 1;
        if self.progress_interval > 0 && report.nodes_processed % self.progress_interval == 0 {
            tracing::info!(
                nodes = report.nodes_processed,
                "Processed {} records...",
                report.nodes_processed
            );
        }

        match node {
            OpenNode::Record(record) => {
                report.records_seen += 1;
                handler.on_record(&record);
            }
            OpenNode::Workout(workout) => {
                report.workouts_seen += 1;
                handler.on_workout(&workout);
            }
            OpenNode::Other => {}
        }
    }

    fn xml_error(&self, source: quick_xml::Error) -> DigestError {
        DigestError::XmlError {
            position: self.reader.buffer_position() as u64,
            source,
        }
    }
}
