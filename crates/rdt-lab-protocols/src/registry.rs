use rdt_lab_abstract::{ConfigError, ProtocolConfig, ProtocolKind, Receiver, Sender};

use crate::alternating::{AltReceiver, AltSender};
use crate::gbn::{GbnReceiver, GbnSender};
use crate::naive::{NaiveReceiver, NaiveSender};

/// One sender and one receiver for a simulated connection.
pub type ProtocolPair = (Box<dyn Sender>, Box<dyn Receiver>);

/// Build the sender/receiver pair described by `config`.
pub fn build_pair(config: &ProtocolConfig) -> Result<ProtocolPair, ConfigError> {
    config.validate()?;
    Ok((sender(config), receiver(config.kind)))
}

pub fn sender(config: &ProtocolConfig) -> Box<dyn Sender> {
    match config.kind {
        ProtocolKind::Naive => Box::new(NaiveSender),
        ProtocolKind::AlternatingBit => Box::new(AltSender::new(config.timeout)),
        ProtocolKind::GoBackN => Box::new(GbnSender::new(config.window_size, config.timeout)),
    }
}

pub fn receiver(kind: ProtocolKind) -> Box<dyn Receiver> {
    match kind {
        ProtocolKind::Naive => Box::new(NaiveReceiver),
        ProtocolKind::AlternatingBit => Box::new(AltReceiver::new()),
        ProtocolKind::GoBackN => Box::new(GbnReceiver::new()),
    }
}
