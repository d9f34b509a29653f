//! Basic motor control example.
//!
//! Builds a motor from a TOML configuration and runs a ramped move against a
//! simulated clock, printing the speed profile as it goes.
//!
//! This example uses the crate's simulated hardware so it runs anywhere.

use stepper_ramp::io::sim::{RecordingEmitter, SimClock, SimPin};
use stepper_ramp::{parse_config, MoveState, StepperMotorBuilder};

const CONFIG: &str = r#"
[motors.demo]
name = "demo_motor"
resolution = 16
microsteps = 16
max_speed_per_sec = 3200
acceleration_per_sec2 = 6400

[motors.demo.limits]
forward = 16000
reverse = -16000
"#;

fn main() {
    println!("=== Basic Motor Control Example ===\n");

    let config = parse_config(CONFIG).expect("Failed to parse config");
    println!("Loaded configuration with {} motor(s)", config.motors.len());

    let clock = SimClock::new(0);
    let mut motor = StepperMotorBuilder::new()
        .from_config(&config, "demo")
        .expect("Motor not found")
        .emitter(RecordingEmitter::new())
        .dir_pin(SimPin::new())
        .enable_pin(SimPin::new())
        .clock(clock.source())
        .build()
        .expect("Failed to build motor");

    println!("Motor created: {}", motor.name());
    println!("Initial position: {} units", motor.pos());

    // One full revolution at 1/16 microstepping
    motor.prepare_move(3200).expect("Failed to plan move");

    if let Some(profile) = motor.profile() {
        println!("\n=== Motion Profile ===");
        println!("Total pulses: {}", profile.dist_total);
        println!("Direction: {:?}", profile.direction);
        println!("Acceleration phase: {} pulses", profile.accel_steps());
        println!("Cruise phase: {} pulses", profile.run_steps());
        println!("Deceleration phase: {} pulses", profile.decel_steps());
        println!("Top speed: {} pulses/s", profile.top_speed);
        println!("Triangular: {}", profile.is_triangular());
    }

    println!("\n=== Executing ===");
    let mut last_state = MoveState::Stopped;
    let start = clock.now();
    loop {
        let state = motor.tick().expect("Pulse output failed");
        if state != last_state {
            println!(
                "{:>9} us  {:<8} pos {:>5}  speed {:>5} units/s",
                clock.now().wrapping_sub(start),
                state.name(),
                motor.pos(),
                motor.current_speed()
            );
            last_state = state;
        }
        if !state.is_active() {
            break;
        }
        clock.advance(10);
    }

    println!("\nFinal position: {} units", motor.pos());
    println!("Pulses emitted: {}", motor.emitter().pulses());
    println!("\n=== Example Complete ===");
}
