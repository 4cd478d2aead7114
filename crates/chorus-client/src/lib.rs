//! Chorus chat client.
//!
//! A thin TCP layer over [`chorus_proto`]: connect, send the username
//! handshake, then exchange frames. [`ChatClient`] sends [`Message`]s and
//! receives the lines the server delivers, one [`Line`](chorus_proto::payloads::chat::Line)
//! frame per line.
//!
//! For front-ends that read and write from different tasks,
//! [`ChatClient::into_split`] hands out independent halves.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use chorus_proto::{Message, Payload, ProtocolError, io};
use thiserror::Error;
use tokio::{
    io::AsyncWriteExt,
    net::{
        TcpStream, ToSocketAddrs,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
};

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Malformed or unexpected frame, or transport failure mid-frame.
    #[error("protocol error: {0}")]
    Protocol(ProtocolError),

    /// The server closed the connection.
    #[error("connection closed")]
    Closed,
}

impl From<ProtocolError> for ClientError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::ConnectionClosed => Self::Closed,
            other => Self::Protocol(other),
        }
    }
}

/// Connected chat client.
#[derive(Debug)]
pub struct ChatClient {
    username: String,
    sender: ChatSender,
    receiver: ChatReceiver,
}

impl ChatClient {
    /// Connect and announce `username`.
    pub async fn connect(addr: impl ToSocketAddrs, username: &str) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).await.map_err(|e| ClientError::Connect(e.to_string()))?;
        stream.set_nodelay(true).map_err(|e| ClientError::Connect(e.to_string()))?;

        let (reader, writer) = stream.into_split();
        let mut sender = ChatSender { writer };
        sender.send_payload(Payload::hello(username)).await?;

        Ok(Self {
            username: username.to_string(),
            sender,
            receiver: ChatReceiver { reader },
        })
    }

    /// Name announced at connect time.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Send one request.
    pub async fn send(&mut self, message: Message) -> Result<(), ClientError> {
        self.sender.send(message).await
    }

    /// Send chat text.
    pub async fn say(&mut self, text: impl Into<String>) -> Result<(), ClientError> {
        self.sender.send(Message::Text(text.into())).await
    }

    /// Wait for the next delivered line.
    pub async fn recv_line(&mut self) -> Result<String, ClientError> {
        self.receiver.recv_line().await
    }

    /// Send LOGOUT and close the write side.
    pub async fn logout(mut self) -> Result<(), ClientError> {
        self.sender.send(Message::Logout).await?;
        self.sender.close().await
    }

    /// Separate sending and receiving halves.
    pub fn into_split(self) -> (ChatSender, ChatReceiver) {
        (self.sender, self.receiver)
    }
}

/// Write half of a [`ChatClient`].
#[derive(Debug)]
pub struct ChatSender {
    writer: OwnedWriteHalf,
}

impl ChatSender {
    /// Send one request.
    pub async fn send(&mut self, message: Message) -> Result<(), ClientError> {
        self.send_payload(message.into()).await
    }

    /// Shut down the write side. The server sees end of stream.
    pub async fn close(&mut self) -> Result<(), ClientError> {
        self.writer.shutdown().await.map_err(|e| ClientError::from(ProtocolError::from(e)))
    }

    async fn send_payload(&mut self, payload: Payload) -> Result<(), ClientError> {
        let frame = payload.into_frame()?;
        io::write_frame(&mut self.writer, &frame).await?;
        Ok(())
    }
}

/// Read half of a [`ChatClient`].
#[derive(Debug)]
pub struct ChatReceiver {
    reader: OwnedReadHalf,
}

impl ChatReceiver {
    /// Wait for the next delivered line.
    ///
    /// # Errors
    ///
    /// - `ClientError::Closed` if the server closed the connection
    /// - `ClientError::Protocol` for anything but a `Line` frame
    pub async fn recv_line(&mut self) -> Result<String, ClientError> {
        let frame = io::read_frame(&mut self.reader).await?;

        match Payload::from_frame(&frame)? {
            Payload::Line(line) => Ok(line.text),
            other => Err(ClientError::Protocol(ProtocolError::UnexpectedOpcode(other.opcode()))),
        }
    }
}
