//! Tamper demo
//!
//! Shows:
//! 1. Four files are uploaded into the tree
//! 2. A client keeps only the root
//! 3. The server returns a file with its proof
//! 4. A tampered copy fails verification
//! 5. A signed checkpoint lets the client refresh its root

use merkle::{verify_proof, CheckpointSigner, MerkleTree};

fn main() {
    println!("╔════════════════════════════════════════════════╗");
    println!("║  Verifiable File Transfer - Tamper Demo        ║");
    println!("╚════════════════════════════════════════════════╝\n");

    println!("📝 Step 1: Server stores four files");
    println!("   ─────────────────────────────────");

    let files: [(&str, &[u8]); 4] = [
        ("example.txt", b"This is an example"),
        ("example2.txt", b"This is an example"),
        ("example3.txt", b"This is an exampl,e2"),
        ("example3s.txt", b"This is an exasmpl,e2"),
    ];

    let mut server_tree = MerkleTree::new();
    for (name, content) in &files {
        let position = server_tree.append(content).expect("append rebuilds a non-empty tree");
        println!("   [{position}] {name}");
    }
    let root = server_tree.root().expect("tree has leaves");
    println!("   Root: {}\n", hex::encode(root));

    println!("🔍 Step 2: Client downloads example3.txt");
    println!("   ──────────────────────────────────────");

    let (_, content) = files[2];
    let position = server_tree.position_of(content).expect("uploaded above");
    let proof = server_tree.generate_proof(position).expect("position in range");
    println!("   Leaf position: {position}");
    println!("   Proof size: {} sibling digests", proof.len());
    for (level, sibling) in proof.siblings.iter().enumerate() {
        println!("     level {level}: {}", hex::encode(sibling));
    }

    if verify_proof(content, &proof, &root) {
        println!("   ✓ Content matches trusted root\n");
    }

    println!("😈 Step 3: Server tampers with the bytes");
    println!("   ───────────────────────────────────────");

    let tampered = b"This is an exampl,e3";
    println!("   Original: {}", String::from_utf8_lossy(content));
    println!("   Tampered: {}", String::from_utf8_lossy(tampered));

    if verify_proof(tampered, &proof, &root) {
        println!("   ✓ Data is valid\n");
    } else {
        println!("   ✗ INTEGRITY VIOLATION: proof does not reproduce the trusted root\n");
    }

    println!("🔐 Step 4: Duplicate content");
    println!("   ─────────────────────────");

    let (_, dup) = files[1];
    println!(
        "   example2.txt resolves to position {} (first upload of the same bytes)\n",
        server_tree.position_of(dup).expect("uploaded above")
    );

    println!("✍️  Step 5: Signed checkpoint");
    println!("   ─────────────────────────");

    let signer = CheckpointSigner::generate();
    let signed = signer
        .sign(server_tree.checkpoint().expect("tree has leaves"))
        .expect("checkpoint encodes");
    println!("   Server key: {}", hex::encode(signer.verifying_key().as_bytes()));
    if signed.verify(&signer.verifying_key()) {
        println!("   ✓ Checkpoint for {} leaves verified", signed.checkpoint.leaf_count);
    }
    println!();

    println!("╔════════════════════════════════════════════════╗");
    println!("║  ✓ Proofs reproduce the root from content      ║");
    println!("║  ✓ Any altered byte breaks verification        ║");
    println!("║  ✓ Only the root needs to be trusted           ║");
    println!("╚════════════════════════════════════════════════╝");
}
