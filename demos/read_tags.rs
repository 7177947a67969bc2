//! Multi-poll inventory against a reader on a serial port.
//!
//! Usage: read_tags [PORT] [ROUNDS]

use std::collections::HashMap;
use std::time::Duration;

use r200_rfid::{Epc, R200, SerialTransport};

// Labels for known tags
const REGISTERED: [(&str, u32); 4] = [
    ("e28069150000501d63e8f8e4", 1),
    ("e28069150000501d63e900e4", 2),
    ("e28069150000401d63e904e4", 3),
    ("e28069150000401d63e8fce4", 4),
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let port = args.next().unwrap_or_else(|| "/dev/ttyUSB0".to_string());
    let rounds = match args.next() {
        Some(n) => n.parse()?,
        None => 10,
    };

    let registered = REGISTERED
        .iter()
        .map(|&(hex, label)| Ok((hex.parse::<Epc>()?, label)))
        .collect::<Result<HashMap<_, _>, r200_rfid::UhfError>>()?;

    let transport = SerialTransport::new(&port, 115200)?;
    let mut rfid = R200::open(transport, Duration::from_secs(1)).with_poll_rounds(rounds);

    let read = rfid.read_tags()?;
    let mut labels = Vec::new();
    for (i, tag) in read.pool.iter().enumerate() {
        println!("{}:", i + 1);
        println!("\tRSSI: {}", tag.rssi);
        println!("\tPC: 0x{:04X}", tag.pc);
        println!("\tEPC: {}", tag.epc);
        println!("\tCRC: 0x{:04X}", tag.crc);
        if let Some(&label) = registered.get(&tag.epc) {
            println!("\tLabel {}", label);
            labels.push(label);
        }
    }
    println!("Labels detected: {:?}", labels);
    if !read.rejected.is_empty() {
        println!("Rejected frames: {}", read.rejected.len());
    }

    if let Some(e) = read.error {
        println!("Error: {}", e);
    }

    rfid.close()?;
    Ok(())
}
