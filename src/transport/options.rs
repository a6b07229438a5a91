use std::convert::TryFrom;
use tokio::time::Duration;

#[derive(Clone, Debug, Default)]
pub struct TransportOptions {
    // Upper bound on a whole outbound call: connecting, sending, and waiting for the reply.
    pub reply_timeout: Option<Duration>,
    // Delay between connection attempts to a peer that refused the connection.
    pub reconnect_interval: Option<Duration>,
    pub max_frame_size: Option<usize>,
    // Number of received requests that may wait for the inbound server.
    pub inbound_queue_size: Option<usize>,
}

#[derive(Clone, Debug)]
pub(crate) struct TransportOptionsValidated {
    pub(crate) reply_timeout: Duration,
    pub(crate) reconnect_interval: Duration,
    pub(crate) max_frame_size: usize,
    pub(crate) inbound_queue_size: usize,
}

impl TransportOptionsValidated {
    fn validate(&self) -> Result<(), &'static str> {
        if self.reply_timeout == Duration::from_millis(0) {
            return Err("Reply timeout must be greater than zero");
        }
        if self.reconnect_interval >= self.reply_timeout {
            return Err("Reconnect interval must be less than the reply timeout");
        }
        if self.max_frame_size == 0 {
            return Err("Max frame size must be greater than zero");
        }
        if self.inbound_queue_size == 0 {
            return Err("Inbound queue size must be greater than zero");
        }

        Ok(())
    }
}

impl TryFrom<TransportOptions> for TransportOptionsValidated {
    type Error = &'static str;

    fn try_from(options: TransportOptions) -> Result<Self, Self::Error> {
        let values = TransportOptionsValidated {
            reply_timeout: options.reply_timeout.unwrap_or(Duration::from_secs(1)),
            reconnect_interval: options.reconnect_interval.unwrap_or(Duration::from_millis(100)),
            max_frame_size: options.max_frame_size.unwrap_or(16 * 1024 * 1024),
            inbound_queue_size: options.inbound_queue_size.unwrap_or(64),
        };

        values.validate()?;
        Ok(values)
    }
}
