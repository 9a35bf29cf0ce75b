//! Signing and verification driven by asynchronously supplied inputs.
//!
//! A [`DataSource`] is a one-shot cell holding a byte buffer.
//! It is either known up front ([`DataSource::ready`]) or filled through the [`DataSink`] half of a [`DataSource::channel`].
//!
//! [`SignStream`] and [`VerifyStream`] join two sources and run the signature operation exactly once,
//! after both have settled, in whichever order they settle.
//! They are futures: the outcome is delivered once, as the output of the future.

use std::future::Future;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use tokio::sync::oneshot;

use crate::compact::{self, DecodeOptions, Decoded};
use crate::{AlgorithmProvider, Encoding, Error, Header, Input, Result};

/// Writer half of a [`DataSource`].
///
/// Writes accumulate in a buffer owned by the sink.
/// The source settles when the sink is [finished](DataSink::finish);
/// dropping the sink without finishing settles the source with [`Error::SourceClosed`].
#[derive(Debug)]
pub struct DataSink {
	buffer: Vec<u8>,
	sender: oneshot::Sender<Vec<u8>>,
}

impl DataSink {
	/// Append a chunk to the buffer.
	pub fn write(&mut self, chunk: impl AsRef<[u8]>) {
		self.buffer.extend_from_slice(chunk.as_ref());
	}

	/// Finalize the buffer and settle the source.
	pub fn finish(self) {
		// The source may already be gone, in which case nobody is waiting for the data.
		let _ = self.sender.send(self.buffer);
	}

	/// Write a last chunk and finish.
	pub fn end(mut self, chunk: impl AsRef<[u8]>) {
		self.write(chunk);
		self.finish();
	}
}

#[derive(Debug)]
enum SourceState {
	Known(Vec<u8>),
	Waiting(oneshot::Receiver<Vec<u8>>),
	Settled,
}

/// A byte buffer that becomes available exactly once.
///
/// A source settles when it is first polled after its data is final,
/// never during construction, so a source that is known up front goes through the same steps as one that is written later.
#[derive(Debug)]
pub struct DataSource {
	state: SourceState,
}

impl DataSource {
	/// A source with data that is already known.
	pub fn ready(data: impl Into<Vec<u8>>) -> Self {
		Self { state: SourceState::Known(data.into()) }
	}

	/// An empty source together with the sink that fills it.
	pub fn channel() -> (DataSink, DataSource) {
		let (sender, receiver) = oneshot::channel();
		let sink = DataSink { buffer: Vec::new(), sender };
		(sink, Self { state: SourceState::Waiting(receiver) })
	}

	/// A source that settles with the given input converted to bytes.
	pub fn from_input(input: &Input, encoding: Encoding) -> Result<Self> {
		Ok(Self::ready(input.to_bytes(encoding)?))
	}

	/// Check if the source has already delivered its data.
	pub fn is_settled(&self) -> bool {
		matches!(self.state, SourceState::Settled)
	}
}

impl From<Vec<u8>> for DataSource {
	fn from(data: Vec<u8>) -> Self {
		Self::ready(data)
	}
}

impl From<&[u8]> for DataSource {
	fn from(data: &[u8]) -> Self {
		Self::ready(data)
	}
}

impl From<&str> for DataSource {
	fn from(data: &str) -> Self {
		Self::ready(data)
	}
}

impl From<String> for DataSource {
	fn from(data: String) -> Self {
		Self::ready(data)
	}
}

impl Future for DataSource {
	type Output = Result<Vec<u8>>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		let result = match &mut self.state {
			SourceState::Known(data)        => Ok(std::mem::take(data)),
			SourceState::Waiting(receiver) => ready!(Pin::new(receiver).poll(cx)).map_err(|_| Error::SourceClosed),
			SourceState::Settled           => panic!("`DataSource` polled after it settled"),
		};
		self.state = SourceState::Settled;
		Poll::Ready(result)
	}
}

/// State of a driver joining two sources.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinState {
	/// Neither source has settled.
	WaitingBoth,
	/// One source has settled.
	WaitingOne,
	/// Both sources have settled and the operation is running.
	Ready,
	/// The operation succeeded and its result was delivered.
	Done,
	/// A source or the operation failed.
	Failed,
}

#[derive(Debug)]
enum Slot {
	Waiting(DataSource),
	Settled(Vec<u8>),
	Taken,
}

impl Slot {
	/// Poll the source if it hasn't settled yet.
	///
	/// Returns `Ok(true)` once the slot holds data.
	fn poll_settle(&mut self, name: &'static str, cx: &mut Context<'_>) -> Result<bool> {
		let source = match self {
			Slot::Waiting(source) => source,
			Slot::Settled(_)      => return Ok(true),
			Slot::Taken           => return Ok(false),
		};
		match Pin::new(source).poll(cx) {
			Poll::Pending => Ok(false),
			Poll::Ready(data) => {
				let data = data?;
				tracing::trace!(source = name, len = data.len(), "source settled");
				*self = Slot::Settled(data);
				Ok(true)
			},
		}
	}

	fn take(&mut self) -> Vec<u8> {
		match std::mem::replace(self, Slot::Taken) {
			Slot::Settled(data) => data,
			_ => Vec::new(),
		}
	}
}

/// Join of two sources with a single-use trigger.
#[derive(Debug)]
struct Join {
	names:  [&'static str; 2],
	first:  Slot,
	second: Slot,
	state:  JoinState,
}

impl Join {
	fn new(names: [&'static str; 2], first: DataSource, second: DataSource) -> Self {
		Self {
			names,
			first:  Slot::Waiting(first),
			second: Slot::Waiting(second),
			state:  JoinState::WaitingBoth,
		}
	}

	/// Poll both sources and hand out their data exactly once, when both have settled.
	fn poll_join(&mut self, cx: &mut Context<'_>) -> Poll<Result<(Vec<u8>, Vec<u8>)>> {
		match self.state {
			JoinState::WaitingBoth | JoinState::WaitingOne => (),
			state => panic!("source join polled in state {:?}", state),
		}

		let settled = self.first.poll_settle(self.names[0], cx)
			.and_then(|first| Ok((first, self.second.poll_settle(self.names[1], cx)?)));

		let state = match settled {
			Err(error) => {
				self.transition(JoinState::Failed);
				return Poll::Ready(Err(error));
			},
			Ok((true, true))   => JoinState::Ready,
			Ok((false, false)) => JoinState::WaitingBoth,
			Ok(_)              => JoinState::WaitingOne,
		};

		self.transition(state);
		if state == JoinState::Ready {
			Poll::Ready(Ok((self.first.take(), self.second.take())))
		} else {
			Poll::Pending
		}
	}

	fn transition(&mut self, state: JoinState) {
		if self.state != state {
			tracing::debug!(from = ?self.state, to = ?state, "join state changed");
			self.state = state;
		}
	}

	/// Record the outcome of the operation.
	fn finish<T>(&mut self, result: Result<T>) -> Result<T> {
		match &result {
			Ok(_)      => self.transition(JoinState::Done),
			Err(error) => {
				tracing::warn!(%error, "operation failed");
				self.transition(JoinState::Failed);
			},
		}
		result
	}
}

/// Future that signs a payload once both the key material and the payload are available.
///
/// Resolves to the compact JWS.
#[derive(Debug)]
pub struct SignStream<P> {
	header:   Header,
	provider: P,
	join:     Join,
}

impl<P: AlgorithmProvider> SignStream<P> {
	/// Create a driver waiting for the key material and the payload.
	///
	/// Nothing is read or signed until the future is polled.
	pub fn new(header: Header, key: impl Into<DataSource>, payload: impl Into<DataSource>, provider: P) -> Self {
		Self {
			header,
			provider,
			join: Join::new(["key", "payload"], key.into(), payload.into()),
		}
	}

	pub fn state(&self) -> JoinState {
		self.join.state
	}
}

impl<P: AlgorithmProvider + Unpin> Future for SignStream<P> {
	type Output = Result<String>;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		let this = self.get_mut();
		let (key, payload) = ready!(this.join.poll_join(cx))?;

		let result = compact::sign(&this.header, &Input::Bytes(payload), Encoding::Utf8, key, &this.provider);
		Poll::Ready(this.join.finish(result))
	}
}

/// Outcome of a [`VerifyStream`].
#[derive(Clone, Debug, PartialEq)]
pub struct Verified {
	/// Whether the signature matched.
	pub valid: bool,
	/// The decoded token.
	pub decoded: Decoded,
}

/// Future that verifies a compact JWS once both the token and the key material are available.
///
/// Resolves to the verification result together with the decoded token.
#[derive(Debug)]
pub struct VerifyStream<P> {
	algorithm: String,
	options:   DecodeOptions,
	provider:  P,
	join:      Join,
}

impl<P: AlgorithmProvider> VerifyStream<P> {
	/// Create a driver waiting for the signed token and the key material.
	///
	/// The algorithm is only checked once both sources have settled,
	/// so a missing algorithm fails the driver rather than the constructor.
	pub fn new(algorithm: impl Into<String>, signature: impl Into<DataSource>, key: impl Into<DataSource>, provider: P) -> Self {
		Self {
			algorithm: algorithm.into(),
			options:   DecodeOptions::default(),
			provider,
			join:      Join::new(["signature", "key"], signature.into(), key.into()),
		}
	}

	/// Set the options used to decode the token.
	pub fn with_options(mut self, options: DecodeOptions) -> Self {
		self.options = options;
		self
	}

	pub fn state(&self) -> JoinState {
		self.join.state
	}

	fn run(&self, token: Vec<u8>, key: Vec<u8>) -> Result<Verified> {
		let token   = String::from_utf8(token)?;
		let valid   = compact::verify(&token, &self.algorithm, key, &self.provider)?;
		let decoded = compact::decode(&token, &self.options)?;
		Ok(Verified { valid, decoded })
	}
}

impl<P: AlgorithmProvider + Unpin> Future for VerifyStream<P> {
	type Output = Result<Verified>;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		let this = self.get_mut();
		let (token, key) = ready!(this.join.poll_join(cx))?;

		let result = this.run(token, key);
		Poll::Ready(this.join.finish(result))
	}
}

/// Create a [`SignStream`].
pub fn create_sign<P: AlgorithmProvider>(header: Header, key: impl Into<DataSource>, payload: impl Into<DataSource>, provider: P) -> SignStream<P> {
	SignStream::new(header, key, payload, provider)
}

/// Create a [`VerifyStream`].
pub fn create_verify<P: AlgorithmProvider>(algorithm: impl Into<String>, signature: impl Into<DataSource>, key: impl Into<DataSource>, provider: P) -> VerifyStream<P> {
	VerifyStream::new(algorithm, signature, key, provider)
}
