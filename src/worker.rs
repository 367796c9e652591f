//! Background question answering
//!
//! The TUI event loop must keep drawing while upstream APIs are slow, so
//! questions are answered on a tokio task and replies come back over a
//! channel.

use tokio::sync::mpsc;

use crate::chat::{ChatAgent, Reply};

/// Messages sent from the worker to the main loop
#[derive(Debug, Clone)]
pub enum WorkerMessage {
    /// An answer to the question with the given id
    Answered { id: u64, reply: Reply },
}

/// A question waiting for an answer
#[derive(Debug, Clone)]
struct Question {
    id: u64,
    text: String,
}

/// Handle for talking to the background answer task
pub struct ChatWorker {
    /// Channel for receiving replies
    receiver: mpsc::Receiver<WorkerMessage>,
    questions: mpsc::Sender<Question>,
    next_id: u64,
}

impl ChatWorker {
    /// Spawns the answer task on the current tokio runtime
    pub fn spawn(agent: ChatAgent) -> Self {
        let (reply_tx, reply_rx) = mpsc::channel(8);
        let (question_tx, mut question_rx) = mpsc::channel::<Question>(8);

        tokio::spawn(async move {
            while let Some(question) = question_rx.recv().await {
                let reply = agent.respond(&question.text).await;
                let message = WorkerMessage::Answered {
                    id: question.id,
                    reply,
                };
                if reply_tx.send(message).await.is_err() {
                    // Main loop has gone away
                    break;
                }
            }
            tracing::debug!("answer worker stopped");
        });

        Self {
            receiver: reply_rx,
            questions: question_tx,
            next_id: 0,
        }
    }

    /// Queues a question, returning its id, or `None` if the queue is full
    /// or the worker has stopped
    pub fn ask(&mut self, text: impl Into<String>) -> Option<u64> {
        let id = self.next_id;
        let question = Question {
            id,
            text: text.into(),
        };
        match self.questions.try_send(question) {
            Ok(()) => {
                self.next_id += 1;
                Some(id)
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not queue question");
                None
            }
        }
    }

    /// Checks for a finished answer without blocking
    pub fn try_recv(&mut self) -> Option<WorkerMessage> {
        self.receiver.try_recv().ok()
    }
}
