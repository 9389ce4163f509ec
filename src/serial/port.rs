use std::fmt;
use std::future::Future;

use log::{error, info};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::Duration;
use tokio_serial::SerialPortBuilderExt;
pub use tokio_serial::{DataBits, FlowControl, Parity, SerialStream, StopBits};

use crate::config::BAUD_RATE;
use crate::error::{BridgeError, Result};

/// serial port settings
#[derive(Clone, Debug)]
pub struct PortSettings {
    pub port_name: String,
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
    pub flow_control: FlowControl,
    pub timeout: Duration,
}

/// serial port settings implementation
impl PortSettings {
    /// 8N1 without flow control at the device baud rate
    pub fn new(port_name: impl Into<String>) -> Self {
        PortSettings {
            port_name: port_name.into(),
            baud_rate: BAUD_RATE,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
            flow_control: FlowControl::None,
            timeout: Duration::from_millis(100),
        }
    }

    /// override the baud rate
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }
}

impl fmt::Display for PortSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} baud ({}{}{})",
            self.port_name,
            self.baud_rate,
            data_bits_digit(self.data_bits),
            parity_letter(self.parity),
            stop_bits_digit(self.stop_bits)
        )
    }
}

fn data_bits_digit(data_bits: DataBits) -> char {
    match data_bits {
        DataBits::Five => '5',
        DataBits::Six => '6',
        DataBits::Seven => '7',
        DataBits::Eight => '8',
    }
}

fn stop_bits_digit(stop_bits: StopBits) -> char {
    match stop_bits {
        StopBits::One => '1',
        StopBits::Two => '2',
    }
}

fn parity_letter(parity: Parity) -> char {
    match parity {
        Parity::None => 'N',
        Parity::Odd => 'O',
        Parity::Even => 'E',
    }
}

/// open serial port
pub fn open_port(settings: &PortSettings) -> Result<SerialStream> {
    match tokio_serial::new(&settings.port_name, settings.baud_rate)
        .data_bits(settings.data_bits)
        .parity(settings.parity)
        .stop_bits(settings.stop_bits)
        .flow_control(settings.flow_control)
        .timeout(settings.timeout)
        .open_native_async()
    {
        Ok(stream) => {
            info!("Connected to {}. Listening for commands...", settings.port_name);
            Ok(stream)
        }
        Err(e) => {
            error!("Unable to open serial port {}: {}", settings.port_name, e);
            Err(BridgeError::port_open(&settings.port_name, e.to_string()))
        }
    }
}

/// Something that can (re)open the device connection.
pub trait Connector: Send {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Human readable target, for logs.
    fn target(&self) -> String;

    fn connect(&mut self) -> impl Future<Output = Result<Self::Stream>> + Send;
}

/// Opens a real serial port.
pub struct SerialConnector {
    settings: PortSettings,
}

impl SerialConnector {
    pub fn new(settings: PortSettings) -> Self {
        Self { settings }
    }
}

impl Connector for SerialConnector {
    type Stream = SerialStream;

    fn target(&self) -> String {
        self.settings.port_name.clone()
    }

    async fn connect(&mut self) -> Result<SerialStream> {
        open_port(&self.settings)
    }
}
