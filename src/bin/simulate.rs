//! A sample run of the veto protocol with every participant on its own thread
use anonymous_veto::{
    arithmetics::Ring,
    ballot::Vote,
    barrier::LocalBarrier,
    noise::NoiseSampler,
    participant::{setup, Participant},
    store::MemoryStore,
    tally::{tally, Verdict},
};
use rand::Rng;
use std::thread;

const PARTICIPANTS: usize = 8;
const ROUNDS: usize = 10;

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();
    let ring = Ring::default();
    let mut rng = rand::thread_rng();

    for round in 0..ROUNDS {
        // every other round somebody vetoes
        let vetoer = if round % 2 == 1 {
            Some(rng.gen_range(0..PARTICIPANTS))
        } else {
            None
        };
        let store = MemoryStore::new();
        let barrier = LocalBarrier::new();
        setup(&store, &ring, &mut NoiseSampler::for_party(PARTICIPANTS)).unwrap();

        thread::scope(|scope| {
            for id in 0..PARTICIPANTS {
                let store = &store;
                let barrier = &barrier;
                scope.spawn(move || {
                    let vote = if vetoer == Some(id) {
                        Vote::Veto
                    } else {
                        Vote::Allow
                    };
                    let mut participant = Participant::new(
                        id,
                        PARTICIPANTS,
                        ring,
                        store,
                        barrier,
                        NoiseSampler::for_party(id),
                    )
                    .unwrap();
                    participant.cast(vote).unwrap();
                });
            }
        });

        let result = tally(&store, &ring, PARTICIPANTS).unwrap();
        let expected = match vetoer {
            Some(_) => Verdict::SomeoneVetoed,
            None => Verdict::AllAllowed,
        };
        if result.get_verdict() != expected {
            panic!("round {round}: tally says {}", result.get_verdict());
        }
        println!(
            "round {round}: {} ({} vs. {})",
            result.get_verdict(),
            result.get_inf_norm(),
            result.get_threshold()
        );
    }
    println!("Every round decoded correctly!");
}
