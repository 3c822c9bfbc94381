//! Console host for configured SoundTouch speakers
//!
//! Loads a platform config, prints every entity update the SDK pushes and
//! follows each device's event stream until Ctrl-C.
//!
//! Run with: cargo run -p soundtouch-sdk --example kitchen_speaker -- config.json

use std::sync::Arc;

use soundtouch_sdk::{
    init_logging, logging_mode, EntityHost, EntityKind, HostEntity, PlatformConfig, SdkError,
    SoundTouchPlatform,
};

struct ConsoleEntity {
    label: String,
}

impl HostEntity for ConsoleEntity {
    fn update_on(&self, on: bool) {
        println!("{:<32} {}", self.label, if on { "on" } else { "off" });
    }

    fn update_level(&self, level: u8) {
        println!("{:<32} level {}", self.label, level);
    }

    fn update_mute(&self, muted: bool) {
        println!("{:<32} {}", self.label, if muted { "muted" } else { "unmuted" });
    }
}

struct ConsoleHost;

impl EntityHost for ConsoleHost {
    fn get_or_create_entity(&self, kind: EntityKind, name: &str, tag: &str) -> Arc<dyn HostEntity> {
        println!("+ {:?} '{}' ({})", kind, name, tag);
        Arc::new(ConsoleEntity { label: format!("{} [{}]", name, tag) })
    }

    fn remove_entity(&self, kind: EntityKind, tag: &str) {
        println!("- {:?} ({})", kind, tag);
    }
}

#[tokio::main]
async fn main() -> Result<(), SdkError> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "config.json".to_string());
    let config = PlatformConfig::from_path(&path)?;
    if let Err(e) = init_logging(logging_mode(&config)) {
        eprintln!("Logging disabled: {}", e);
    }

    let mut platform = SoundTouchPlatform::from_config(&config, |_| Arc::new(ConsoleHost) as Arc<dyn EntityHost>).await?;
    for accessory in platform.accessories() {
        let info = accessory.information();
        println!(
            "{}: {} {} (serial {}, firmware {})",
            accessory.name(),
            info.manufacturer,
            info.model,
            info.serial_number,
            info.firmware_revision.as_deref().unwrap_or("unknown")
        );
    }

    platform.start().await;
    println!("Watching {} device(s), Ctrl-C to quit", platform.streams().len());
    tokio::signal::ctrl_c().await?;
    platform.stop();
    Ok(())
}
