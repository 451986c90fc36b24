//! Strategy behaviour over whole interactions, played synchronously.

use parley_agents::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

fn vocab(names: &[&str]) -> Vec<Symbol> {
    names.iter().map(|s| Symbol::from(*s)).collect()
}

fn suffix_map(v: &[Symbol]) -> SymbolMap {
    v.iter().map(|s| (s.clone(), Symbol::new(format!("{}1", s)))).collect()
}

/// Plays one interaction turn by turn. Each side keeps its own history;
/// received symbols are recorded under the speaker's id.
fn play(a: &mut Agent, b: &mut Agent, pa: &Protocol, pb: &Protocol, pattern: &TurnPattern) -> (Outcome, Outcome) {
    a.begin_interaction();
    b.begin_interaction();
    let (mut ha, mut hb) = (Vec::new(), Vec::new());
    let mut completed = true;
    for speaker in pattern.iter() {
        let (sp, li, psp, pli, hsp, hli) = if speaker == a.id() {
            (&mut *a, &mut *b, pa, pb, &mut ha, &mut hb)
        } else {
            (&mut *b, &mut *a, pb, pa, &mut hb, &mut ha)
        };
        let Some(said) = sp.speak(psp, hsp) else {
            completed = false;
            break;
        };
        let Some(read) = li.hear(pli, hli, &said) else {
            completed = false;
            break;
        };
        hsp.push(Event::new(speaker, said));
        hli.push(Event::new(speaker, read));
    }
    (a.finish(pa, &ha, completed), b.finish(pb, &hb, completed))
}

fn random_protocol(rng: &mut StdRng, v: &[Symbol]) -> Protocol {
    let agents = [AgentId::FIRST, AgentId::SECOND];
    let mut rules = Vec::new();
    for _ in 0..3 {
        let a = v.choose(rng).unwrap().clone();
        let b = v.choose(rng).unwrap().clone();
        let ag = *agents.choose(rng).unwrap();
        let agr = *agents.choose(rng).unwrap();
        if rng.gen_bool(0.3) {
            rules.push(Rule::existential(a, ag, rng.gen_bool(0.5)));
        } else {
            let kind = *RelationKind::ALL.choose(rng).unwrap();
            rules.push(Rule::relation(a, b, kind, rng.gen_bool(0.5), ag, agr));
        }
    }
    Protocol::new(v.to_vec(), rules, "random")
}

#[test]
fn frequency_rows_stay_normalised() {
    let v0 = vocab(&["o", "s", "x", "z"]);
    let map = suffix_map(&v0);
    let v1: Vec<Symbol> = v0.iter().map(|s| map[s].clone()).collect();
    let mut rng = StdRng::seed_from_u64(99);
    let mut a = AgentBuilder::new(AgentId::FIRST, v0.clone()).seed(1).build().unwrap();
    let mut b = AgentBuilder::new(AgentId::SECOND, v1).seed(2).build().unwrap();
    let pattern = TurnPattern::alternating(6).unwrap();

    for _ in 0..40 {
        let p0 = random_protocol(&mut rng, &v0);
        let p1 = p0.translate(&map).unwrap();
        play(&mut a, &mut b, &p0, &p1, &pattern);
        for agent in [&a, &b] {
            let alg = agent.alignment();
            for f in alg.foreign_symbols() {
                let total: f64 = alg.row(f).unwrap().values().sum();
                assert!(total == 0.0 || (total - 1.0).abs() < 1e-9, "row {} sums to {}", f, total);
            }
        }
    }
    assert_eq!(a.outcomes().len(), 40);
}

#[test]
fn logical_two_symbol_elimination_is_sound() {
    // ground truth: p reads as x
    let own = vocab(&["x", "y"]);
    let protocol = Protocol::new(
        own.clone(),
        vec![Rule::existential("y", AgentId::SECOND, false)],
        "two",
    );
    let mut agent = AgentBuilder::new(AgentId::FIRST, own)
        .kind(AgentKind::Logical)
        .seed(4)
        .build()
        .unwrap();
    agent.begin_interaction();
    assert_eq!(agent.possible_worlds().unwrap().len(), 2);

    let read = agent.hear(&protocol, &[], &"p".into());
    assert_eq!(read, Some(Symbol::from("x")));

    let worlds = agent.possible_worlds().unwrap();
    assert_eq!(worlds.len(), 1);
    let survivor = worlds.iter().next().unwrap();
    assert_eq!(worlds.mapping(survivor).get(&Symbol::from("p")), Some(&Symbol::from("x")));

    let history = vec![Event::new(AgentId::SECOND, "x")];
    assert_eq!(agent.finish(&protocol, &history, true), Outcome::Verified);
    assert_eq!(agent.alignment().best(&"p".into()), Some(&Symbol::from("x")));
}

#[test]
fn logical_worlds_never_grow_within_an_interaction() {
    let v0 = vocab(&["o", "s", "x", "z"]);
    let map = suffix_map(&v0);
    let v1: Vec<Symbol> = v0.iter().map(|s| map[s].clone()).collect();
    let mut rng = StdRng::seed_from_u64(5);

    for round in 0..30 {
        let p0 = random_protocol(&mut rng, &v0);
        let p1 = p0.translate(&map).unwrap();
        let mut a = AgentBuilder::new(AgentId::FIRST, v0.clone())
            .kind(AgentKind::Logical)
            .seed(round)
            .build()
            .unwrap();
        a.begin_interaction();
        let mut speaker = AgentBuilder::new(AgentId::SECOND, v1.clone()).seed(round + 100).build().unwrap();
        speaker.begin_interaction();

        let mut heard_by_a = Vec::new();
        let mut said_by_b = Vec::new();
        let mut last = a.possible_worlds().unwrap().len();
        for _ in 0..4 {
            let Some(symbol) = speaker.speak(&p1, &said_by_b) else { break };
            let Some(read) = a.hear(&p0, &heard_by_a, &symbol) else { break };
            said_by_b.push(Event::new(AgentId::SECOND, symbol));
            heard_by_a.push(Event::new(AgentId::SECOND, read));
            let now = a.possible_worlds().unwrap().len();
            assert!(now <= last, "worlds grew from {} to {}", last, now);
            last = now;
        }
    }
}

fn world_count(agent: &Agent) -> usize {
    agent.possible_worlds().map_or(0, |w| w.len())
}

#[test]
fn logical_pairs_only_ever_shrink_their_worlds() {
    let v0 = vocab(&["o", "s", "x", "z"]);
    let map = suffix_map(&v0);
    let v1: Vec<Symbol> = v0.iter().map(|s| map[s].clone()).collect();
    let pattern = TurnPattern::alternating(6).unwrap();
    let mut rng = StdRng::seed_from_u64(17);

    for pair in 0..40u64 {
        let mut a = AgentBuilder::new(AgentId::FIRST, v0.clone())
            .kind(AgentKind::Logical)
            .seed(2 * pair + 1)
            .build()
            .unwrap();
        let mut b = AgentBuilder::new(AgentId::SECOND, v1.clone())
            .kind(AgentKind::Logical)
            .seed(2 * pair + 2)
            .build()
            .unwrap();
        let mut last = [world_count(&a), world_count(&b)];

        for _ in 0..30 {
            let p0 = random_protocol(&mut rng, &v0);
            let p1 = p0.translate(&map).unwrap();
            a.begin_interaction();
            b.begin_interaction();
            let (mut ha, mut hb) = (Vec::new(), Vec::new());
            for speaker in pattern.iter() {
                let first_speaks = speaker == a.id();
                let (sp, li, psp, pli, hsp, hli) = if first_speaks {
                    (&mut a, &mut b, &p0, &p1, &mut ha, &mut hb)
                } else {
                    (&mut b, &mut a, &p1, &p0, &mut hb, &mut ha)
                };
                let Some(said) = sp.speak(psp, hsp) else { break };
                let read = li.hear(pli, hli, &said);

                let slot = usize::from(first_speaks);
                let now = world_count(li);
                assert!(now > 0, "pair {} emptied its worlds", pair);
                assert!(now <= last[slot], "pair {} worlds grew from {} to {}", pair, last[slot], now);
                last[slot] = now;

                let Some(read) = read else { break };
                hsp.push(Event::new(speaker, said));
                hli.push(Event::new(speaker, read));
            }
            a.finish(&p0, &ha, false);
            b.finish(&p1, &hb, false);
        }
    }
}

#[test]
fn simple_learners_complete_unconstrained_interactions() {
    let v0 = vocab(&["o", "s"]);
    let map = suffix_map(&v0);
    let p0 = Protocol::new(v0.clone(), vec![], "free");
    let p1 = p0.translate(&map).unwrap();
    let v1 = p1.vocabulary().to_vec();
    for kind in AgentKind::ALL {
        let mut a = AgentBuilder::new(AgentId::FIRST, v0.clone()).kind(kind).seed(1).build().unwrap();
        let mut b = AgentBuilder::new(AgentId::SECOND, v1.clone()).kind(kind).seed(2).build().unwrap();
        let (oa, ob) = play(&mut a, &mut b, &p0, &p1, &TurnPattern::alternating(2).unwrap());
        assert!(oa.is_success(), "{} failed", kind);
        assert!(ob.is_success(), "{} failed", kind);
    }
}

#[test]
fn prior_alignment_seeds_best_reading() {
    let v = vocab(&["x", "y", "z"]);
    let mut prior = SymbolMap::new();
    prior.insert("q".into(), "z".into());
    let agent = AgentBuilder::new(AgentId::FIRST, v).prior(prior).seed(0).build().unwrap();
    assert_eq!(agent.alignment().best(&"q".into()), Some(&Symbol::from("z")));
}
