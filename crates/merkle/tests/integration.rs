use merkle::{verify_proof, MerkleError, MerkleTree};
use rand::Rng;

fn tree_of(contents: &[&[u8]]) -> MerkleTree {
    let mut tree = MerkleTree::new();
    for c in contents {
        tree.append(c).unwrap();
    }
    tree
}

#[test]
fn test_rebuild_is_deterministic() {
    let contents: [&[u8]; 6] = [b"alpha", b"beta", b"gamma", b"delta", b"eps", b"zeta"];

    let first = tree_of(&contents);
    let second = tree_of(&contents);
    assert_eq!(first.root().unwrap(), second.root().unwrap());

    let mut again = first.clone();
    again.rebuild().unwrap();
    assert_eq!(again.root().unwrap(), first.root().unwrap());
}

#[test]
fn test_every_position_verifies() {
    for size in 1..=17usize {
        let contents: Vec<Vec<u8>> = (0..size).map(|i| format!("file-{i}").into_bytes()).collect();
        let mut tree = MerkleTree::new();
        tree.add_leaves(&contents).unwrap();
        let root = tree.root().unwrap();

        for (i, content) in contents.iter().enumerate() {
            let proof = tree.generate_proof(i).unwrap();
            assert_eq!(proof.len(), tree.height());
            assert!(verify_proof(content, &proof, &root), "size {size} position {i}");
        }
    }
}

#[test]
fn test_tamper_detection() {
    let contents: [&[u8]; 5] = [b"one", b"two", b"three", b"four", b"five"];
    let tree = tree_of(&contents);
    let root = tree.root().unwrap();

    for (i, content) in contents.iter().enumerate() {
        let proof = tree.generate_proof(i).unwrap();

        for byte in 0..content.len() {
            let mut tampered = content.to_vec();
            tampered[byte] ^= 0x01;
            assert!(!verify_proof(&tampered, &proof, &root));
        }

        for level in 0..proof.len() {
            for byte in 0..32 {
                let mut bad = proof.clone();
                bad.siblings[level][byte] ^= 0x80;
                assert!(!verify_proof(content, &bad, &root));
            }
        }
    }
}

#[test]
fn test_position_bounds() {
    let tree = tree_of(&[b"a", b"b", b"c"]);

    assert!(matches!(
        tree.generate_proof(3),
        Err(MerkleError::InvalidPosition {
            position: 3,
            leaf_count: 3
        })
    ));
    assert!(matches!(
        tree.generate_proof(usize::MAX),
        Err(MerkleError::InvalidPosition { .. })
    ));
    assert!(matches!(tree.position_of(b"never inserted"), Err(MerkleError::NotFound)));

    let empty = MerkleTree::new();
    assert!(matches!(empty.generate_proof(0), Err(MerkleError::InvalidPosition { .. })));
}

#[test]
fn test_odd_counts_build() {
    for size in [1usize, 2, 3, 5] {
        let contents: Vec<Vec<u8>> = (0..size).map(|i| vec![b'a' + i as u8]).collect();
        let mut tree = MerkleTree::new();
        tree.add_leaves(&contents).unwrap();
        assert!(tree.root().is_ok(), "size {size}");
    }

    let single = tree_of(&[b"a"]);
    let proof = single.generate_proof(0).unwrap();
    assert!(proof.is_empty());
    assert!(verify_proof(b"a", &proof, &single.root().unwrap()));
}

#[test]
fn test_abcd_scenario() {
    let tree = tree_of(&[b"a", b"b", b"c", b"d"]);
    let root = tree.root().unwrap();

    let proof = tree.generate_proof(1).unwrap();
    assert_eq!(proof.len(), 2);
    assert!(verify_proof(b"b", &proof, &root));
    assert!(!verify_proof(b"x", &proof, &root));
}

#[test]
fn test_duplicate_content() {
    let tree = tree_of(&[b"first", b"dup", b"mid", b"dup"]);
    let root = tree.root().unwrap();

    assert_eq!(tree.position_of(b"dup").unwrap(), 1);

    let p1 = tree.generate_proof(1).unwrap();
    let p3 = tree.generate_proof(3).unwrap();
    assert!(verify_proof(b"dup", &p1, &root));
    assert!(verify_proof(b"dup", &p3, &root));
}

#[test]
fn test_proof_is_stale_after_append() {
    let mut tree = tree_of(&[b"a", b"b"]);
    let old_root = tree.root().unwrap();
    let old_proof = tree.generate_proof(0).unwrap();

    tree.append(b"c").unwrap();
    let new_root = tree.root().unwrap();
    assert_ne!(old_root, new_root);

    assert!(verify_proof(b"a", &old_proof, &old_root));
    assert!(!verify_proof(b"a", &old_proof, &new_root));
    assert!(verify_proof(b"a", &tree.generate_proof(0).unwrap(), &new_root));
}

#[test]
fn test_randomized_uploads() {
    let mut tree = MerkleTree::new();
    let mut rng = rand::thread_rng();
    let mut contents = Vec::new();

    for _ in 0..200 {
        let len = rng.gen_range(0..64);
        let content: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        let position = tree.append(&content).unwrap();
        assert_eq!(position, contents.len());
        contents.push(content);

        let root = tree.root().unwrap();
        let pick = rng.gen_range(0..contents.len());
        let expected = tree.position_of(&contents[pick]).unwrap();
        let proof = tree.generate_proof(expected).unwrap();
        assert!(verify_proof(&contents[pick], &proof, &root));
    }
}
