use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("pinwire {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: pinwire");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("PINWIRE_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "profile: {}",
        option_env!("PINWIRE_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("message_types: {}", pinwire_frame::MESSAGE_TYPE_COUNT);
    println!(
        "protocol_magic: 0x{:08X}",
        pinwire_frame::PROTOCOL_MAGIC
    );
    println!(
        "features: device={}, cli=true",
        cfg!(feature = "device")
    );

    Ok(SUCCESS)
}
