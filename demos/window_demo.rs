use spikenet::core::connections::{connect, connect_to_channel};
use spikenet::core::execution::{ConcurrencyMode, SimulationConfig, SimulationEngine};
use spikenet::core::network::Network;
use spikenet::core::nodes::archiving::ArchivingNode;
use spikenet::core::nodes::builtin::{IafNeuron, PoissonGenerator, SpikeRecorder};
use spikenet::core::proxy::{EventChannelProxy, RecordingTransport};
use spikenet::core::registry::NodeRegistry;
use spikenet::core::scheduler::SchedulerContext;
use spikenet::core::status::{StatusMap, StatusValue};
use spikenet::{EventKind, KernelResult};

fn main() -> KernelResult<()> {
    env_logger::init();

    let config = SimulationConfig::new()
        .with_window_steps(3)
        .with_base_seed(42)
        .with_threads(2)
        .with_concurrency(ConcurrencyMode::Rayon);

    let mut registry = NodeRegistry::new(config.n_threads);
    let mut network = Network::new(config.n_threads, config.base_seed);
    let mut scheduler = SchedulerContext::new();

    // build the population
    let generator = registry.add(Box::new(PoissonGenerator::new(0.8)));
    let neuron = registry.add(Box::new(IafNeuron::new()));
    let recorder = registry.add(Box::new(SpikeRecorder::new()));
    let transport = RecordingTransport::new();
    let proxy = registry.add(Box::new(EventChannelProxy::new(
        "spikes_out",
        4,
        Box::new(transport.clone()),
    )));

    // a more excitable neuron for the demo
    let mut status = StatusMap::new();
    status.insert("threshold".to_string(), StatusValue::Real(2.0));
    registry.get_mut(neuron)?.set_status(&status)?;

    // wire it up; delays fix the scheduler's min/max
    connect(
        &mut registry,
        &mut network,
        &mut scheduler,
        generator,
        neuron,
        EventKind::Spike,
        0,
        3,
    )?;
    connect(
        &mut registry,
        &mut network,
        &mut scheduler,
        neuron,
        recorder,
        EventKind::Spike,
        0,
        4,
    )?;
    connect_to_channel(
        &mut registry,
        &mut network,
        &mut scheduler,
        neuron,
        proxy,
        2,
        3,
    )?;

    println!(
        "scheduler: min delay {:?}, max delay {:?}",
        scheduler.min_delay(),
        scheduler.max_delay()
    );

    // freeze the external channel before the first window
    registry.get_as_mut::<EventChannelProxy>(proxy)?.publish()?;

    let mut engine = SimulationEngine::new(registry, network, scheduler, config)?;
    let end = engine.run(40)?;
    println!("ran 40 windows, origin now {}", end);

    let spikes = engine.registry().get_as::<SpikeRecorder>(recorder)?;
    println!("recorder saw {} spikes:", spikes.recorded().len());
    for (time, sender) in spikes.recorded() {
        println!("  {} from node {}", time, sender);
    }

    let neuron_ref = engine.registry().get_as::<IafNeuron>(neuron)?;
    match neuron_ref.get_spiketime() {
        Some(t) => println!("neuron last spiked at {:.1} ms", t),
        None => println!("neuron never spiked"),
    }

    println!("channel forwarded {} events:", transport.forwarded().len());
    for (channel, time_ms) in transport.forwarded() {
        println!("  channel {} at {:.1} ms", channel, time_ms);
    }

    Ok(())
}
