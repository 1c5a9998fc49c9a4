//! Fixed sample guide served by `/demo`.

/// File name reported with the sample guide.
pub const DEMO_FILE_NAME: &str = "Sample_Lesson_Introduction_to_AI";

/// Sample guide HTML following the generation prompt's hierarchy.
pub const DEMO_HTML: &str = r#"<h1>Introduction to Artificial Intelligence</h1>

<h2>Session Overview</h2>
<p>In this session, students are introduced to the concept of Artificial Intelligence through hands-on exploration and guided discussion. The lesson flows from a curiosity-driven warm-up activity into a structured explanation of how AI works, followed by a creative design task where students map out a simple AI solution to a real-world problem. By the end of the session, students will be able to articulate what AI is, how it learns, and where it appears in everyday life.</p>

<h2>Learning Objectives</h2>
<ul>
  <li>Recognise the definition of Artificial Intelligence and distinguish it from regular software.</li>
  <li>Identify at least three real-world examples of AI in everyday life.</li>
  <li>Analyse how data is used to train AI models using a simple visual example.</li>
  <li>Design a basic flowchart that describes how an AI system would solve a chosen problem.</li>
  <li>Apply critical thinking to evaluate the benefits and limitations of AI tools.</li>
</ul>

<h2>Preparation</h2>
<p><strong>Subject Knowledge:</strong> Review the basics of machine learning, supervised vs unsupervised learning, and common AI applications (image recognition, chatbots, recommendation systems).<br/><strong>You Will Need:</strong> Slides (provided), Teacher Guide, printed AI example cards, internet-connected devices for students, and access to Teachable Machine.<br/><strong>You May Need:</strong> A backup offline activity in case of connectivity issues; do a trial run of the Teachable Machine demo before class.</p>

<h2>Lesson Procedure</h2>

<h3>Initiate</h3>
<p>1. Start with a quick poll: Ask students to raise their hands if they used AI today. Accept all answers and validate them.<br/>2. Show a short 60-second video clip of AI in action (voice assistant, self-driving car, recommendation engine).<br/>3. Ask: "What do you think made the computer able to do that?" Allow 3–4 responses.<br/>4. Write the word AI on the board and say: "By the end of today, you will be able to explain exactly what this means and how it works."</p>

<h3>Learn</h3>
<p>1. Display Slide 3: Definition. Read it aloud, then ask a student to rephrase it in their own words.<br/>2. Use the analogy: "Teaching an AI is like teaching a child — you show it many examples until it learns the pattern."<br/>3. Slide 4 — Show the training data diagram. Walk through each step: Data → Training → Model → Prediction.<br/>4. Pause and ask: "If we trained an AI on only pictures of cats, what would happen if we showed it a dog?" Wait for responses.<br/>5. Slide 5 — Real-world examples. For each example, ask students where they have seen it.</p>

<h3>Make</h3>
<p>1. Distribute the "AI Problem Solver" worksheet (or project it on screen).<br/>2. Students choose a real problem (e.g., detecting ripe fruit, filtering spam emails).<br/>3. They draw a simple 4-step flowchart: Problem → Data Needed → How AI Learns → Output.<br/>4. Circulate the room. For students who are stuck, ask: "What information would a human need to solve this? That is likely the data your AI needs."<br/>5. Early finishers: Challenge them to add a "What could go wrong?" box to their flowchart.</p>

<h3>Share</h3>
<p>1. Ask 2–3 volunteers to share their flowcharts with the class.<br/>2. For each presentation, prompt the audience: "Does this AI need a lot of data or a little? Why?"<br/>3. Wrap up by asking the full class: "Name one thing AI is great at and one thing humans still do better."<br/>4. Close with: "Next lesson we will actually train our own AI model using Teachable Machine."</p>

<h2>Glossary</h2>
<ul>
  <li><strong>Artificial Intelligence (AI):</strong> A computer system that can perform tasks that normally require human intelligence, like recognising images or understanding speech.</li>
  <li><strong>Machine Learning:</strong> A type of AI where the computer learns from examples (data) instead of being told exact rules.</li>
  <li><strong>Training Data:</strong> A large collection of examples used to teach an AI model how to make decisions.</li>
  <li><strong>Algorithm:</strong> A step-by-step set of instructions a computer follows to solve a problem.</li>
  <li><strong>Model:</strong> The result of training an AI — a program that can make predictions based on what it has learned.</li>
</ul>

<h2>Bonus Activities</h2>
<p>1. Explore Google's Teachable Machine (teachablemachine.withgoogle.com) and train a model to recognise hand gestures using only the webcam.<br/>2. Research one AI system that had a bias problem (e.g., facial recognition accuracy disparities) and write a short paragraph explaining what went wrong and how it could be fixed.<br/>3. Create a short comic strip (4 panels) telling the story of how an AI learns to do one task.</p>"#;
