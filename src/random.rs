use tracing::debug;

use crate::{
    alphabet::Alphabet,
    automaton::{Automaton, Transition},
};

/// Generate a random Mealy machine with `size` states by randomly drawing transitions, using
/// the given random number generator. The input alphabet consists of `inputs` symbols named
/// `a, b, …` (or `s0, s1, …` if there are more than 26), the outputs are named `0, 1, …` and
/// the states `q0, q1, …`. The algorithm is as follows:
/// 1. Start with `size` states and no transitions.
/// 2. For each state and each symbol, draw a target state and an output.
///
/// The resulting transition function is total. Depending on the drawn targets, some states
/// may be unreachable from the initial state `q0`.
pub fn generate_random_mealy_with(
    rng: &mut fastrand::Rng,
    inputs: usize,
    outputs: usize,
    size: usize,
) -> Automaton {
    assert!(size > 0, "an automaton needs at least one state");
    assert!(outputs > 0 || inputs == 0, "cannot emit from an empty output alphabet");

    let input_alphabet = if inputs <= 26 {
        Alphabet::try_from_labels((0..inputs).map(|i| ((b'a' + i as u8) as char).to_string()))
            .unwrap_or_else(|_| Alphabet::numbered("s", inputs))
    } else {
        Alphabet::numbered("s", inputs)
    };
    let output_alphabet = Alphabet::numbered("", outputs);

    let table = (0..size)
        .map(|_| {
            (0..inputs)
                .map(|_| Some(Transition::new(rng.usize(..size), rng.usize(..outputs))))
                .collect()
        })
        .collect();

    let automaton = Automaton::from_parts(
        input_alphabet,
        output_alphabet,
        Alphabet::numbered("q", size),
        0,
        table,
    );
    debug!(
        "generated random mealy machine with {} states, {} of them accessible",
        size,
        automaton.accessible_states().len()
    );
    automaton
}

/// Works as [`generate_random_mealy_with`], but draws from a freshly seeded generator.
pub fn generate_random_mealy(inputs: usize, outputs: usize, size: usize) -> Automaton {
    generate_random_mealy_with(&mut fastrand::Rng::new(), inputs, outputs, size)
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::{generate_random_mealy, generate_random_mealy_with};

    #[test]
    fn random_mealy_sized() {
        let mm = generate_random_mealy(2, 3, 10);
        assert_eq!(mm.size(), 10);
        assert!(mm.is_complete());
        assert_eq!(mm.inputs().labels().collect_vec(), vec!["a", "b"]);
        assert_eq!(mm.outputs().labels().collect_vec(), vec!["0", "1", "2"]);
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let first = generate_random_mealy_with(&mut fastrand::Rng::with_seed(3), 2, 2, 6);
        let second = generate_random_mealy_with(&mut fastrand::Rng::with_seed(3), 2, 2, 6);
        assert_eq!(first.transition_table(), second.transition_table());
    }

    #[test]
    fn large_alphabets_are_numbered() {
        let mm = generate_random_mealy(30, 1, 1);
        assert_eq!(mm.inputs().try_nth(29), Some("s29"));
    }
}
