use std::{process, thread, time::Duration};

use log::{error, info};

mod app;
mod ring;

use app::App;

fn main() {
    env_logger::init();

    info!("Pitlane Dedicated Server Demo started");

    let mut app = match App::from_env() {
        Ok(app) => app,
        Err(err) => {
            error!("Cannot start: {}", err);
            process::exit(1);
        }
    };
    loop {
        app.update();
        thread::sleep(Duration::from_millis(app.tick_ms()));
    }
}
