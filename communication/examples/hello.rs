use sieve_communication::{Allocate, Collectives, Config, Pull, Push};

fn main() {

    // configure from the command line, e.g. `-w 4`.
    let config = Config::from_args(std::env::args()).expect("valid configuration");

    let guards = sieve_communication::initialize(config, |mut allocator| {

        println!("worker {} of {} started", allocator.index(), allocator.peers());

        // allocates a pair of senders list and one receiver.
        let (mut senders, mut receiver) = allocator.allocate::<String>(2);

        // send typed data along each channel
        for (index, sender) in senders.iter_mut().enumerate() {
            sender.send(format!("hello, {}", index));
            sender.done();
        }

        // no support for termination notification,
        // we have to count down ourselves.
        let mut received = 0;
        while received < allocator.peers() {
            match receiver.recv() {
                Some(message) => {
                    println!("worker {}: received: <{}>", allocator.index(), message);
                    received += 1;
                }
                None => allocator.await_events(None),
            }
        }

        // collectives use their own channels, after the one above.
        let mut collectives = Collectives::new(allocator);
        collectives.barrier();
        collectives.reduce(0, collectives.index() as u64, |x, y| x + y)
    });

    // computation runs until guards are joined or dropped.
    if let Ok(guards) = guards {
        for guard in guards.join() {
            println!("result: {:?}", guard);
        }
    }
    else { println!("error in computation"); }
}
