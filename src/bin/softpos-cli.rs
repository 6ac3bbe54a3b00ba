//! Demo CLI driving a kernel against a real PC/SC reader. Generalizes the
//! teacher's `main.rs`/`exchange::exchange`: a `PcscTransceiver` implements
//! [`softpos_kernel::transceiver::Transceiver`] over a live `pcsc::Card`,
//! with the same reduce-size (SW1=0x6c) and GET RESPONSE (SW1=0x61) retry
//! loops the teacher's `exchange()` free function used.

use anyhow::Context;
use structopt::StructOpt;

use softpos_kernel::apdu::{CommandApdu, ResponseApdu};
use softpos_kernel::pse;
use softpos_kernel::transceiver::{TransportError, Transceiver};

struct PcscTransceiver<'a> {
    card: &'a mut pcsc::Card,
}

impl Transceiver for PcscTransceiver<'_> {
    fn transceive(&mut self, command: &CommandApdu) -> Result<ResponseApdu, TransportError> {
        let mut receive_buffer = [0u8; 256];
        let raw = command
            .encode()
            .map_err(|err| TransportError::TransceiveFailure(err.to_string()))?;

        let tx = self
            .card
            .transaction()
            .map_err(|err| TransportError::TransceiveFailure(err.to_string()))?;

        let mut data = tx
            .transmit(&raw, &mut receive_buffer)
            .map_err(|err| TransportError::TransceiveFailure(err.to_string()))?
            .to_vec();

        if data.len() >= 2 && data[data.len() - 2] == 0x6c {
            let reduced_le = data[data.len() - 1] as usize;
            let mut reduced = command.clone();
            reduced.le = Some(reduced_le);
            let raw = reduced
                .encode()
                .map_err(|err| TransportError::TransceiveFailure(err.to_string()))?;
            data = tx
                .transmit(&raw, &mut receive_buffer)
                .map_err(|err| TransportError::TransceiveFailure(err.to_string()))?
                .to_vec();
        }

        while data.len() >= 2 && data[data.len() - 2] == 0x61 {
            let sw2 = data[data.len() - 1];
            let continuation = CommandApdu::get_response(sw2 as usize);
            let raw = continuation
                .encode()
                .map_err(|err| TransportError::TransceiveFailure(err.to_string()))?;
            let mut body = data[..data.len() - 2].to_vec();
            data = tx
                .transmit(&raw, &mut receive_buffer)
                .map_err(|err| TransportError::TransceiveFailure(err.to_string()))?
                .to_vec();
            body.extend_from_slice(&data);
            data = body;
        }

        ResponseApdu::from_raw(&data)
            .ok_or_else(|| TransportError::TransceiveFailure("response too short".to_string()))
    }
}

#[derive(Debug, StructOpt)]
struct Options {
    #[structopt(
        short,
        long,
        default_value = "0",
        help = "Reader index, see list-readers"
    )]
    reader: usize,
    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    #[structopt(about = "List connected readers")]
    ListReaders,
    #[structopt(about = "Show the PPSE application directory")]
    ShowPpse,
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let options = Options::from_args();
    let context = pcsc::Context::establish(pcsc::Scope::User)
        .context("failed to create PC/SC session")?;

    match options.cmd {
        Command::ListReaders => list_readers(&context),
        Command::ShowPpse => {
            let mut card = get_card(&options, &context).context("failed to connect to card")?;
            let result = {
                let mut transceiver = PcscTransceiver { card: &mut card };
                pse::discover(&mut transceiver)
            };
            if card.disconnect(pcsc::Disposition::ResetCard).is_err() {
                log::warn!("failed to reset card, it may need to be manually removed");
            }
            let data = result.context("PPSE discovery failed")?;
            println!("{data:#?}");
            Ok(())
        }
    }
}

fn list_readers(context: &pcsc::Context) -> anyhow::Result<()> {
    let readers = context
        .list_readers_owned()
        .context("failed to list readers")?;
    for (idx, reader) in readers.iter().enumerate() {
        println!("{idx}: {reader:?}");
    }
    Ok(())
}

fn get_card(options: &Options, context: &pcsc::Context) -> anyhow::Result<pcsc::Card> {
    let readers = context
        .list_readers_owned()
        .context("failed to list readers")?;
    if options.reader >= readers.len() {
        anyhow::bail!(
            "no reader at index {}, only {} readers found",
            options.reader,
            readers.len()
        );
    }
    Ok(context.connect(
        &readers[options.reader],
        pcsc::ShareMode::Exclusive,
        pcsc::Protocols::ANY,
    )?)
}
