//! The single-writer home of the session's record set.
//!
//! One background task exclusively owns the records; selections, merges,
//! edits, and snapshot reads all arrive as messages. Resolver completions
//! therefore never touch shared state directly, and a merge is atomic
//! relative to any snapshot.

use crate::resolvers::location::ResolvedPlace;
use crate::resolvers::temperature::Temperature;
use crate::structs::{PhotoRecord, Resolution};
use tokio::sync::{mpsc, oneshot};

const COMMAND_BUFFER: usize = 64;

/// One resolver completion, addressed to a single field of a single record.
#[derive(Debug)]
pub enum FieldUpdate {
    Qr(Resolution<String>),
    Place(Resolution<ResolvedPlace>),
    Temperature(Resolution<Temperature>),
}

impl FieldUpdate {
    fn kind(&self) -> &'static str {
        match self {
            FieldUpdate::Qr(_) => "qr",
            FieldUpdate::Place(_) => "place",
            FieldUpdate::Temperature(_) => "temperature",
        }
    }
}

/// A write to one of the user-editable fields.
#[derive(Debug)]
pub enum RecordEdit {
    Notes(String),
    Collector(String),
}

#[derive(Debug)]
enum StoreCommand {
    Select {
        record: PhotoRecord,
        reply: oneshot::Sender<u64>,
    },
    Deselect {
        photo_id: String,
    },
    Merge {
        photo_id: String,
        generation: u64,
        update: FieldUpdate,
    },
    Edit {
        photo_id: String,
        edit: RecordEdit,
    },
    Snapshot {
        reply: oneshot::Sender<Vec<PhotoRecord>>,
    },
}

struct StoredRecord {
    record: PhotoRecord,
    /// Run generation handed out at selection time. A merge whose
    /// generation does not match is from a superseded run and is dropped.
    generation: u64,
}

/// Cloneable handle to the record store task.
#[derive(Debug, Clone)]
pub struct RecordStore {
    tx: mpsc::Sender<StoreCommand>,
}

impl RecordStore {
    /// Spawns the store task. Must be called within a tokio runtime.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        tokio::spawn(run(rx));
        Self { tx }
    }

    /// Inserts a fresh record (or restarts the run of an already-selected
    /// identifier) and returns the new run generation.
    pub async fn select(&self, record: PhotoRecord) -> u64 {
        let (reply, answer) = oneshot::channel();
        let _ = self.tx.send(StoreCommand::Select { record, reply }).await;
        answer.await.unwrap_or_default()
    }

    pub async fn deselect(&self, photo_id: &str) {
        let _ = self
            .tx
            .send(StoreCommand::Deselect {
                photo_id: photo_id.to_string(),
            })
            .await;
    }

    /// Hands a resolver completion to the writer task. Stale completions
    /// (deselected or superseded runs) are discarded there, not here.
    pub async fn merge(&self, photo_id: &str, generation: u64, update: FieldUpdate) {
        let _ = self
            .tx
            .send(StoreCommand::Merge {
                photo_id: photo_id.to_string(),
                generation,
                update,
            })
            .await;
    }

    pub async fn edit(&self, photo_id: &str, edit: RecordEdit) {
        let _ = self
            .tx
            .send(StoreCommand::Edit {
                photo_id: photo_id.to_string(),
                edit,
            })
            .await;
    }

    /// A consistent copy of the record set, in selection order.
    pub async fn snapshot(&self) -> Vec<PhotoRecord> {
        let (reply, answer) = oneshot::channel();
        let _ = self.tx.send(StoreCommand::Snapshot { reply }).await;
        answer.await.unwrap_or_default()
    }
}

async fn run(mut rx: mpsc::Receiver<StoreCommand>) {
    let mut records: Vec<StoredRecord> = Vec::new();
    let mut next_generation: u64 = 0;

    while let Some(command) = rx.recv().await {
        match command {
            StoreCommand::Select { record, reply } => {
                next_generation += 1;
                match records
                    .iter_mut()
                    .find(|stored| stored.record.photo_id == record.photo_id)
                {
                    Some(stored) => {
                        // Restarted run: the old generation's completions
                        // become stale the moment this lands.
                        stored.record = record;
                        stored.generation = next_generation;
                    }
                    None => records.push(StoredRecord {
                        record,
                        generation: next_generation,
                    }),
                }
                let _ = reply.send(next_generation);
            }
            StoreCommand::Deselect { photo_id } => {
                records.retain(|stored| stored.record.photo_id != photo_id);
            }
            StoreCommand::Merge {
                photo_id,
                generation,
                update,
            } => {
                let Some(stored) = records
                    .iter_mut()
                    .find(|stored| stored.record.photo_id == photo_id)
                else {
                    tracing::debug!(
                        photo_id = %photo_id,
                        kind = update.kind(),
                        "merge for deselected photo"
                    );
                    continue;
                };
                if stored.generation != generation {
                    tracing::debug!(
                        photo_id = %photo_id,
                        kind = update.kind(),
                        "merge from superseded run"
                    );
                    continue;
                }
                match update {
                    FieldUpdate::Qr(qr) => stored.record.qr = qr,
                    FieldUpdate::Place(place) => stored.record.place = place,
                    FieldUpdate::Temperature(temperature) => {
                        stored.record.temperature = temperature;
                    }
                }
            }
            StoreCommand::Edit { photo_id, edit } => {
                let Some(stored) = records
                    .iter_mut()
                    .find(|stored| stored.record.photo_id == photo_id)
                else {
                    continue;
                };
                match edit {
                    RecordEdit::Notes(notes) => stored.record.notes = notes,
                    RecordEdit::Collector(collector) => stored.record.collector = collector,
                }
            }
            StoreCommand::Snapshot { reply } => {
                let _ = reply.send(records.iter().map(|stored| stored.record.clone()).collect());
            }
        }
    }
}
